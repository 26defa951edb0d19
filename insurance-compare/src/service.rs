//! ComparisonService – loads a session's results from the backend and hands
//! back the canonical [`ComparisonResult`].
//!
//! The service is cheap to clone (one `Arc`), so create it once at startup and
//! share it across requests:
//!
//! ```rust,ignore
//! let service = ComparisonService::new(Arc::new(HttpComparisonBackend::new(&url)?));
//! let result = service.get_session_results(&session_id).await?;
//! ```
//!
//! Each call issues the primary request once and, for reference-only payloads,
//! the offers request once. There is no retry policy here; callers that need a
//! deadline wrap the call themselves or use [`ComparisonService::poll_results`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::{
    backend::ComparisonBackend,
    error::{CompareError, Result},
    models::ComparisonResult,
    normalizer::normalize_payload,
};

/// Statuses meaning the backend is still computing the session.
pub const IN_PROGRESS_STATUSES: [&str; 2] = ["processing", "pending"];

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    pub request_timeout: Duration,
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(15),
            max_attempts: 30,
        }
    }
}

#[derive(Clone)]
pub struct ComparisonService {
    backend: Arc<dyn ComparisonBackend>,
}

impl ComparisonService {
    pub fn new(backend: Arc<dyn ComparisonBackend>) -> Self {
        Self { backend }
    }

    pub async fn get_session_results(&self, session_id: &str) -> Result<ComparisonResult> {
        if session_id.trim().is_empty() {
            return Err(CompareError::MissingSessionId);
        }

        let payload = self.backend.session_results(session_id).await?;
        let result = normalize_payload(session_id, &payload, || {
            self.backend.session_offers(session_id)
        })
        .await?;

        info!(
            session_id = %session_id,
            status = %result.status,
            offers = result.offers.len(),
            scores = result.scores.len(),
            "session results normalized"
        );
        Ok(result)
    }

    /// Requests results until the session leaves its in-progress status.
    ///
    /// Every attempt is an independent request bounded by
    /// `options.request_timeout`. After `max_attempts` the last result is
    /// returned whatever its status.
    pub async fn poll_results(
        &self,
        session_id: &str,
        options: PollOptions,
    ) -> Result<ComparisonResult> {
        let attempts = options.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let result = tokio::time::timeout(
                options.request_timeout,
                self.get_session_results(session_id),
            )
            .await
            .map_err(|_| CompareError::Timeout(options.request_timeout))??;

            if !is_in_progress(&result) || attempt >= attempts {
                return Ok(result);
            }

            debug!(
                session_id = %session_id,
                attempt,
                status = %result.status,
                "session still processing"
            );
            attempt += 1;
            tokio::time::sleep(options.interval).await;
        }
    }
}

pub fn is_in_progress(result: &ComparisonResult) -> bool {
    IN_PROGRESS_STATUSES
        .iter()
        .any(|s| result.status.eq_ignore_ascii_case(s))
}
