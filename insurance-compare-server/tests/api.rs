use axum::{
    Router,
    body::Body,
    extract::Path,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use insurance_compare::{ComparisonService, HttpComparisonBackend, InMemoryComparisonBackend};
use insurance_compare_server::{AppState, build_router};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

fn offer(id: &str) -> Value {
    json!({
        "id": id,
        "insurerId": "ins-1",
        "category": "home",
        "isActive": true,
        "displayOrder": 0,
        "metadata": {},
        "insurer": { "id": "ins-1", "name": "Habitat Mutuel", "slug": "habitat-mutuel", "logoUrl": null, "rating": 4.1 },
        "formulas": []
    })
}

async fn upstream_results(Path(session_id): Path<String>) -> Response {
    match session_id.as_str() {
        "canonical" => Json(json!({
            "status": "completed",
            "message": "Comparaison terminée",
            "sessionId": "canonical",
            "offers": [offer("a")],
            "scores": { "a": 72.5 },
            "totalOffers": 4,
            "filteredCount": 1
        }))
        .into_response(),
        "reference" | "reference-broken" => Json(json!({
            "status": "completed",
            "resultOfferIds": ["a", "b"],
            "resultScores": { "a": 1.0, "b": 2.0 }
        }))
        .into_response(),
        "garbage" => Json(json!({})).into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "offers": [], "scores": {} })).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "unknown session").into_response(),
    }
}

async fn upstream_offers(Path(session_id): Path<String>) -> Response {
    match session_id.as_str() {
        "reference" => Json(json!({ "resource": [offer("a"), offer("b")] })).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

/// Serves a fake comparison backend on an ephemeral port and returns its API root.
async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/api/comparison/sessions/{session_id}/results", get(upstream_results))
        .route("/api/comparison/sessions/{session_id}/offers", get(upstream_offers));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

async fn http_app() -> Router {
    let base_url = spawn_upstream().await;
    let backend = HttpComparisonBackend::new(&base_url).unwrap();
    build_router(AppState::new(
        ComparisonService::new(Arc::new(backend)),
        Duration::from_millis(300),
    ))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value, HeaderMap) {
    let response = app.oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (parts.status, value, parts.headers)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = build_router(AppState::new(
        ComparisonService::new(Arc::new(InMemoryComparisonBackend::new())),
        Duration::from_secs(1),
    ));
    let (status, body, headers) = send(app, get_request("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(headers.contains_key("x-correlation-id"));
}

#[tokio::test]
async fn correlation_id_is_propagated() {
    let app = build_router(AppState::new(
        ComparisonService::new(Arc::new(InMemoryComparisonBackend::new())),
        Duration::from_secs(1),
    ));
    let request = Request::builder()
        .uri("/health")
        .header("x-correlation-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let (_, _, headers) = send(app, request).await;
    assert_eq!(headers["x-correlation-id"], "req-42");
}

#[tokio::test]
async fn canonical_results_pass_through() {
    let (status, body, _) = send(http_app().await, get_request("/sessions/canonical/results")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["totalOffers"], 4);
    assert_eq!(body["filteredCount"], 1);
    assert_eq!(body["offers"][0]["id"], "a");
}

#[tokio::test]
async fn reference_results_fetch_offers() {
    let (status, body, _) = send(http_app().await, get_request("/sessions/reference/results")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], "reference");
    assert_eq!(body["offers"].as_array().unwrap().len(), 2);
    assert_eq!(body["scores"], json!({ "a": 1.0, "b": 2.0 }));
    assert_eq!(body["totalOffers"], 2);
}

#[tokio::test]
async fn reference_results_degrade_when_offers_fail() {
    let (status, body, _) =
        send(http_app().await, get_request("/sessions/reference-broken/results")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["offers"], json!([]));
    assert_eq!(body["scores"], json!({ "a": 1.0, "b": 2.0 }));
    assert_eq!(body["totalOffers"], 2);
    assert_eq!(body["filteredCount"], 2);
}

#[tokio::test]
async fn unrecognised_payload_is_bad_gateway() {
    let (status, body, _) = send(http_app().await, get_request("/sessions/garbage/results")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "invalid server response");
    assert_eq!(body["session_id"], "garbage");
}

#[tokio::test]
async fn upstream_error_is_bad_gateway() {
    let (status, body, _) = send(http_app().await, get_request("/sessions/unknown/results")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "comparison backend request failed");
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let (status, body, _) = send(http_app().await, get_request("/sessions/slow/results")).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["session_id"], "slow");
}

#[tokio::test]
async fn blank_session_id_is_bad_request() {
    let (status, _, _) = send(http_app().await, get_request("/sessions/%20/results")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn in_memory_missing_session_is_not_found() {
    let app = build_router(AppState::new(
        ComparisonService::new(Arc::new(InMemoryComparisonBackend::new())),
        Duration::from_secs(1),
    ));
    let (status, body, _) = send(app, get_request("/sessions/nope/results")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["session_id"], "nope");
}

#[tokio::test]
async fn guarantee_stats_report() {
    let app = build_router(AppState::new(
        ComparisonService::new(Arc::new(InMemoryComparisonBackend::new())),
        Duration::from_secs(1),
    ));
    let guarantee = json!({
        "name": "Dommages électriques",
        "deductible": "250 €",
        "coverages": [
            { "type": "covered", "description": "Surtension" },
            { "type": "covered", "description": "Foudre" }
        ],
        "details": [{
            "service": "Électroménager",
            "plafond": "3 000 €",
            "coverages": [
                { "type": "covered", "description": "Réfrigérateur" },
                { "type": "not_covered", "description": "Usure" }
            ]
        }]
    });
    let (status, body, _) = send(app, post_json("/guarantees/stats", guarantee)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["coveragePercentage"], 75);
    assert_eq!(body["stats"]["totalItems"], 4);
    assert_eq!(body["services"][0]["ceiling"], "3 000 €");
    assert_eq!(body["financialSummary"]["servicesWithFinancialInfo"], 1);
    assert!(body.get("financial_summary").is_none());
    assert_eq!(body["highlights"]["deductibleRisk"], "medium");
}

#[tokio::test]
async fn zone_summary_lists_sorted_zones_with_positions() {
    let app = build_router(AppState::new(
        ComparisonService::new(Arc::new(InMemoryComparisonBackend::new())),
        Duration::from_secs(1),
    ));
    let zones = json!([
        { "id": "z1", "type": "city", "name": "Marseille", "latitude": "43.3", "longitude": "5.37" },
        { "id": "z2", "type": "country", "name": "Italie", "code": "IT", "latitude": "0", "longitude": "0" },
        { "id": "z3", "type": "region", "name": "Bretagne", "conditions": ["Hors îles"] }
    ]);
    let (status, body, _) = send(app, post_json("/zones/summary", zones)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["all"], 3);
    assert_eq!(body["counts"]["country"], 1);

    let listed = body["zones"].as_array().unwrap();
    let names: Vec<&str> = listed.iter().map(|z| z["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Italie", "Bretagne", "Marseille"]);
    assert_eq!(listed[0]["flag"], "🇮🇹");
    assert_eq!(listed[0]["coordinates"], Value::Null);
    assert_eq!(listed[1]["conditions"], json!(["Hors îles"]));
    assert_eq!(listed[2]["coordinates"], json!([5.37, 43.3]));
}
