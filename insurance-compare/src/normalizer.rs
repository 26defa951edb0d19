//! Turns whatever the backend returned for "get session results" into one
//! canonical [`ComparisonResult`].
//!
//! The endpoint has answered with three shapes over time:
//!
//! 1. the canonical result, fully typed;
//! 2. a minimal result with `offers` and `scores` but loose or missing
//!    status/count fields;
//! 3. a reference-only result carrying `resultOfferIds`/`resultScores`, whose
//!    offer bodies have to be fetched with a second request.
//!
//! [`classify`] tries them in that order and [`normalize_payload`] resolves the
//! winner into a canonical value. Nothing downstream ever sees the raw shapes.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, info, warn};

use crate::error::{CompareError, Result};
use crate::models::{ComparisonResult, Offer};

pub const DEFAULT_STATUS: &str = "success";
pub const DEFAULT_MESSAGE: &str = "OK";

/// A recognised backend response shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    Canonical(ComparisonResult),
    Minimal(MinimalResponse),
    Reference(ReferenceResponse),
}

/// Offers and scores present; everything else optional.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimalResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub offers: Vec<Offer>,
    pub scores: HashMap<String, f64>,
    pub total_offers: Option<usize>,
    pub filtered_count: Option<usize>,
}

/// Only offer ids and scores stored with the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub offer_ids: Vec<Value>,
    pub scores: HashMap<String, f64>,
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

fn count_field(payload: &Value, key: &str) -> Option<usize> {
    payload
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

fn scores_field(payload: &Value, key: &str) -> Option<HashMap<String, f64>> {
    let scores = payload.get(key)?;
    if !scores.is_object() {
        return None;
    }
    serde_json::from_value(scores.clone()).ok()
}

fn strict(payload: &Value) -> Option<ComparisonResult> {
    let result: ComparisonResult = serde_json::from_value(payload.clone()).ok()?;
    if result.session_id.trim().is_empty() {
        return None;
    }
    Some(result)
}

fn minimal(payload: &Value) -> Option<MinimalResponse> {
    let offers = payload.get("offers").filter(|v| v.is_array())?;
    let scores = scores_field(payload, "scores")?;
    let offers: Vec<Offer> = match serde_json::from_value(offers.clone()) {
        Ok(offers) => offers,
        Err(e) => {
            debug!(error = %e, "offers array does not hold valid offers");
            return None;
        }
    };
    Some(MinimalResponse {
        status: string_field(payload, "status"),
        message: string_field(payload, "message"),
        offers,
        scores,
        total_offers: count_field(payload, "totalOffers"),
        filtered_count: count_field(payload, "filteredCount"),
    })
}

fn reference(payload: &Value) -> Option<ReferenceResponse> {
    let offer_ids = payload.get("resultOfferIds")?.as_array()?.clone();
    let scores = scores_field(payload, "resultScores")?;
    Some(ReferenceResponse {
        status: string_field(payload, "status"),
        message: string_field(payload, "message"),
        offer_ids,
        scores,
    })
}

/// Recognises the payload shape, trying the canonical schema first.
pub fn classify(payload: &Value) -> Option<ResponseShape> {
    if let Some(result) = strict(payload) {
        return Some(ResponseShape::Canonical(result));
    }
    if let Some(minimal) = minimal(payload) {
        return Some(ResponseShape::Minimal(minimal));
    }
    reference(payload).map(ResponseShape::Reference)
}

/// Parses an offers-by-session body: a bare array or a `{resource: [...]}` envelope.
pub fn parse_offer_list(body: Value) -> Result<Vec<Offer>> {
    let list = match body {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => match map.remove("resource") {
            Some(resource @ Value::Array(_)) => resource,
            _ => {
                return Err(CompareError::InvalidResponse(
                    "offers body has no resource array".to_string(),
                ));
            }
        },
        _ => {
            return Err(CompareError::InvalidResponse(
                "offers body is not an array".to_string(),
            ));
        }
    };
    Ok(serde_json::from_value(list)?)
}

impl MinimalResponse {
    pub fn into_result(self, session_id: &str) -> ComparisonResult {
        let count = self.offers.len();
        ComparisonResult {
            status: self.status.unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            message: self.message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            session_id: session_id.to_string(),
            offers: self.offers,
            scores: self.scores,
            total_offers: self.total_offers.unwrap_or(count),
            filtered_count: self.filtered_count.unwrap_or(count),
        }
    }
}

impl ReferenceResponse {
    /// Merges the outcome of the secondary offers request. A failed or invalid
    /// secondary response still yields a result: no offers, but the scores and
    /// the referenced offer count.
    pub fn into_result(self, session_id: &str, fetched: Result<Value>) -> ComparisonResult {
        let status = self.status.unwrap_or_else(|| DEFAULT_STATUS.to_string());
        let message = self.message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string());

        match fetched.and_then(parse_offer_list) {
            Ok(offers) => {
                let count = offers.len();
                info!(session_id = %session_id, offers = count, "merged fetched offers into session result");
                ComparisonResult {
                    status,
                    message,
                    session_id: session_id.to_string(),
                    offers,
                    scores: self.scores,
                    total_offers: count,
                    filtered_count: count,
                }
            }
            Err(e) => {
                let count = self.offer_ids.len();
                warn!(
                    session_id = %session_id,
                    referenced = count,
                    error = %e,
                    "offers fetch failed, returning scores without offer bodies"
                );
                ComparisonResult {
                    status,
                    message,
                    session_id: session_id.to_string(),
                    offers: Vec::new(),
                    scores: self.scores,
                    total_offers: count,
                    filtered_count: count,
                }
            }
        }
    }
}

/// Normalizes a session-results payload.
///
/// `fetch_offers` is only awaited for reference-only payloads, and at most once.
pub async fn normalize_payload<F, Fut>(
    session_id: &str,
    payload: &Value,
    fetch_offers: F,
) -> Result<ComparisonResult>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    if session_id.trim().is_empty() {
        return Err(CompareError::MissingSessionId);
    }

    match classify(payload) {
        Some(ResponseShape::Canonical(result)) => {
            debug!(session_id = %session_id, "session result matched canonical schema");
            if result.session_id != session_id {
                debug!(
                    requested = %session_id,
                    returned = %result.session_id,
                    "canonical result carries a different session id"
                );
            }
            Ok(result)
        }
        Some(ResponseShape::Minimal(minimal)) => {
            debug!(session_id = %session_id, "session result matched minimal shape");
            Ok(minimal.into_result(session_id))
        }
        Some(ResponseShape::Reference(reference)) => {
            debug!(
                session_id = %session_id,
                referenced = reference.offer_ids.len(),
                "session result holds offer references, fetching offers"
            );
            let fetched = fetch_offers().await;
            Ok(reference.into_result(session_id, fetched))
        }
        None => {
            warn!(session_id = %session_id, "session result matched no known shape");
            Err(CompareError::invalid_server_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn offer(id: &str) -> Value {
        json!({
            "id": id,
            "insurerId": "ins-1",
            "category": "auto",
            "isActive": true,
            "displayOrder": 0,
            "metadata": {},
            "insurer": {
                "id": "ins-1",
                "name": "Assur Plus",
                "slug": "assur-plus",
                "logoUrl": null,
                "rating": 4.5
            },
            "formulas": [{
                "id": format!("{id}-f"),
                "offerId": id,
                "name": "Tous risques",
                "slug": "tous-risques",
                "annualPremiumCents": 54000,
                "description": "",
                "displayOrder": 0,
                "isRecommended": true,
                "guarantees": [{
                    "id": format!("{id}-g"),
                    "formulaId": format!("{id}-f"),
                    "name": "Bris de glace",
                    "details": "",
                    "ceiling": 1500.0,
                    "deductible": null
                }]
            }]
        })
    }

    async fn never_called() -> Result<Value> {
        panic!("secondary fetch must not run for this shape")
    }

    #[tokio::test]
    async fn canonical_payload_passes_through_unchanged() {
        let payload = json!({
            "status": "completed",
            "message": "2 offres",
            "sessionId": "sess-1",
            "offers": [offer("a"), offer("b")],
            "scores": { "a": 87.5, "b": 64.0 },
            "totalOffers": 5,
            "filteredCount": 2
        });

        let result = normalize_payload("sess-1", &payload, never_called).await.unwrap();
        assert_eq!(result, serde_json::from_value::<ComparisonResult>(payload.clone()).unwrap());
        assert_eq!(serde_json::to_value(&result).unwrap(), payload);
    }

    #[tokio::test]
    async fn minimal_payload_gets_defaults() {
        let payload = json!({ "offers": [], "scores": {} });
        let result = normalize_payload("sess-2", &payload, never_called).await.unwrap();
        assert_eq!(result.status, "success");
        assert_eq!(result.message, "OK");
        assert_eq!(result.session_id, "sess-2");
        assert_eq!(result.total_offers, 0);
        assert_eq!(result.filtered_count, 0);
        assert!(result.offers.is_empty());
    }

    #[tokio::test]
    async fn minimal_payload_keeps_typed_fields_and_ignores_loose_ones() {
        let payload = json!({
            "status": "partial",
            "message": 42,
            "sessionId": "other",
            "offers": [offer("a")],
            "scores": { "a": 12.0 },
            "totalOffers": "7",
            "filteredCount": 1
        });
        let result = normalize_payload("sess-3", &payload, never_called).await.unwrap();
        assert_eq!(result.status, "partial");
        assert_eq!(result.message, "OK");
        assert_eq!(result.session_id, "sess-3");
        assert_eq!(result.total_offers, 1);
        assert_eq!(result.filtered_count, 1);
        assert_eq!(result.score_for("a"), Some(12.0));
    }

    #[tokio::test]
    async fn canonical_with_blank_session_id_falls_back_to_request_id() {
        let payload = json!({
            "status": "completed",
            "message": "ok",
            "sessionId": "",
            "offers": [],
            "scores": {},
            "totalOffers": 0,
            "filteredCount": 0
        });
        let result = normalize_payload("sess-4", &payload, never_called).await.unwrap();
        assert_eq!(result.session_id, "sess-4");
        assert_eq!(result.status, "completed");
    }

    #[tokio::test]
    async fn reference_payload_merges_fetched_offers() {
        let payload = json!({
            "resultOfferIds": ["a", "b"],
            "resultScores": { "a": 1.0, "b": 2.0 }
        });
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = normalize_payload("sess-5", &payload, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!([offer("a"), offer("b")]))
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.offers.len(), 2);
        assert_eq!(result.scores, HashMap::from([("a".to_string(), 1.0), ("b".to_string(), 2.0)]));
        assert_eq!(result.total_offers, 2);
        assert_eq!(result.filtered_count, 2);
        assert_eq!(result.status, "success");
        assert_eq!(result.session_id, "sess-5");
    }

    #[tokio::test]
    async fn reference_payload_accepts_resource_envelope() {
        let payload = json!({
            "resultOfferIds": ["a", "b", "c"],
            "resultScores": { "a": 1.0 }
        });
        let result = normalize_payload("sess-6", &payload, || async {
            Ok(json!({ "resource": [offer("a")] }))
        })
        .await
        .unwrap();
        assert_eq!(result.offers.len(), 1);
        assert_eq!(result.total_offers, 1);
    }

    #[tokio::test]
    async fn reference_payload_degrades_when_fetch_fails() {
        let payload = json!({
            "resultOfferIds": ["a", "b"],
            "resultScores": { "a": 1.0, "b": 2.0 }
        });
        let result = normalize_payload("sess-7", &payload, || async {
            Err(CompareError::Upstream {
                status: 503,
                body: "unavailable".into(),
            })
        })
        .await
        .unwrap();

        assert!(result.offers.is_empty());
        assert_eq!(result.scores, HashMap::from([("a".to_string(), 1.0), ("b".to_string(), 2.0)]));
        assert_eq!(result.total_offers, 2);
        assert_eq!(result.filtered_count, 2);
    }

    #[tokio::test]
    async fn reference_payload_degrades_when_fetched_body_is_invalid() {
        let payload = json!({
            "resultOfferIds": ["a"],
            "resultScores": { "a": 3.0 }
        });
        let result = normalize_payload("sess-8", &payload, || async {
            Ok(json!([{ "id": "a" }]))
        })
        .await
        .unwrap();
        assert!(result.offers.is_empty());
        assert_eq!(result.total_offers, 1);
    }

    #[tokio::test]
    async fn empty_object_is_invalid() {
        let err = normalize_payload("sess-9", &json!({}), never_called)
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::InvalidResponse(ref m) if m == "invalid server response"));
    }

    #[tokio::test]
    async fn non_numeric_scores_are_invalid() {
        let payload = json!({ "offers": [], "scores": { "a": "high" } });
        let err = normalize_payload("sess-10", &payload, never_called)
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn blank_session_id_is_rejected_before_anything_else() {
        let err = normalize_payload("  ", &json!({ "offers": [], "scores": {} }), never_called)
            .await
            .unwrap_err();
        assert!(matches!(err, CompareError::MissingSessionId));
    }

    #[test]
    fn classify_prefers_minimal_over_reference() {
        let payload = json!({
            "offers": [],
            "scores": {},
            "resultOfferIds": ["a"],
            "resultScores": { "a": 1.0 }
        });
        assert!(matches!(classify(&payload), Some(ResponseShape::Minimal(_))));
    }

    #[test]
    fn offer_list_rejects_other_bodies() {
        assert!(parse_offer_list(json!({ "items": [] })).is_err());
        assert!(parse_offer_list(json!("nope")).is_err());
        assert!(parse_offer_list(json!([])).unwrap().is_empty());
    }
}
