use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use insurance_compare::{
    CompareError, ComparisonResult, ComparisonService, Guarantee, Zone,
    ZoneInteractionController, calculate_financial_summary, calculate_guarantee_stats,
    calculate_service_stats, guarantee_highlights,
};
use serde_json::{Value, json};
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::models::{GuaranteeReport, ZoneEntry, ZoneSummary};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

pub const CORRELATION_HEADER: &str = "x-correlation-id";

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn bad_gateway_error(message: &str, id: &str, details: &str) -> ApiError {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({
            "error": message,
            "session_id": id,
            "details": details
        })),
    )
}

fn timeout_error(id: &str, after: Duration) -> ApiError {
    (
        StatusCode::GATEWAY_TIMEOUT,
        Json(json!({
            "error": "comparison backend timed out",
            "session_id": id,
            "timeout_secs": after.as_secs_f64()
        })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub comparison: ComparisonService,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(comparison: ComparisonService, request_timeout: Duration) -> Self {
        Self {
            comparison,
            request_timeout,
        }
    }
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert(CORRELATION_HEADER, value.clone());
        let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
        let mut response = next.run(request).instrument(span).await;
        response.headers_mut().insert(CORRELATION_HEADER, value);
        return response;
    }

    next.run(request).await
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/sessions/{session_id}/results", get(get_session_results))
        .route("/guarantees/stats", post(guarantee_stats))
        .route("/zones/summary", post(zone_summary))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Insurance Comparison Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /sessions/{session_id}/results": "Normalized comparison results for a session",
            "POST /guarantees/stats": "Coverage statistics for a contract guarantee",
            "POST /zones/summary": "Counts and map positions for a contract's zones",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn compare_error_response(session_id: &str, e: CompareError) -> ApiError {
    match e {
        CompareError::MissingSessionId => bad_request_error("session id is required"),
        CompareError::SessionNotFound(_) => not_found_error("Session not found", session_id),
        CompareError::Timeout(after) => timeout_error(session_id, after),
        CompareError::InvalidResponse(ref details) => {
            warn!(session_id = %session_id, details = %details, "backend returned an unusable payload");
            bad_gateway_error("invalid server response", session_id, details)
        }
        other => {
            error!(session_id = %session_id, error = %other, "comparison backend request failed");
            bad_gateway_error("comparison backend request failed", session_id, &other.to_string())
        }
    }
}

async fn get_session_results(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<ComparisonResult> {
    info!(session_id = %session_id, "Getting session results");

    if session_id.trim().is_empty() {
        return Err(bad_request_error("session id is required"));
    }

    let outcome = tokio::time::timeout(
        state.request_timeout,
        state.comparison.get_session_results(&session_id),
    )
    .await
    .unwrap_or(Err(CompareError::Timeout(state.request_timeout)));

    match outcome {
        Ok(result) => Ok(Json(result)),
        Err(e) => Err(compare_error_response(&session_id, e)),
    }
}

async fn guarantee_stats(Json(guarantee): Json<Guarantee>) -> Json<GuaranteeReport> {
    info!(guarantee = %guarantee.name, details = guarantee.details.len(), "Computing guarantee statistics");

    Json(GuaranteeReport {
        stats: calculate_guarantee_stats(&guarantee),
        services: calculate_service_stats(&guarantee),
        financial_summary: calculate_financial_summary(&guarantee),
        highlights: guarantee_highlights(&guarantee),
    })
}

async fn zone_summary(Json(zones): Json<Vec<Zone>>) -> Json<ZoneSummary> {
    let controller = ZoneInteractionController::new(zones);
    let summary = ZoneSummary {
        counts: controller.zone_counts(),
        zones: controller
            .filtered_zones()
            .into_iter()
            .map(ZoneEntry::from)
            .collect(),
    };
    info!(
        zones = summary.counts.all,
        placed = summary.zones.iter().filter(|z| z.coordinates.is_some()).count(),
        "Summarized zones"
    );
    Json(summary)
}
