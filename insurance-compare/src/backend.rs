use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{CompareError, Result};

/// Read-only access to the comparison endpoints of the extraction backend.
///
/// Both calls return the raw JSON body; shape handling belongs to the normalizer.
#[async_trait]
pub trait ComparisonBackend: Send + Sync {
    /// Raw "get session results" payload.
    async fn session_results(&self, session_id: &str) -> Result<Value>;
    /// Raw offers-by-session payload.
    async fn session_offers(&self, session_id: &str) -> Result<Value>;
}

/// In-memory implementation of ComparisonBackend
#[derive(Clone, Default)]
pub struct InMemoryComparisonBackend {
    results: Arc<DashMap<String, Value>>,
    offers: Arc<DashMap<String, Value>>,
}

impl InMemoryComparisonBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_results(&self, session_id: impl Into<String>, payload: Value) {
        self.results.insert(session_id.into(), payload);
    }

    pub fn insert_offers(&self, session_id: impl Into<String>, payload: Value) {
        self.offers.insert(session_id.into(), payload);
    }

    pub fn remove_offers(&self, session_id: &str) -> Option<Value> {
        self.offers.remove(session_id).map(|(_, v)| v)
    }
}

#[async_trait]
impl ComparisonBackend for InMemoryComparisonBackend {
    async fn session_results(&self, session_id: &str) -> Result<Value> {
        self.results
            .get(session_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| CompareError::SessionNotFound(session_id.to_string()))
    }

    async fn session_offers(&self, session_id: &str) -> Result<Value> {
        self.offers
            .get(session_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| CompareError::Upstream {
                status: 404,
                body: format!("no offers for session {session_id}"),
            })
    }
}

#[cfg(feature = "http")]
pub use http::HttpComparisonBackend;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::Url;
    use serde_json::Value;
    use tracing::info;

    use super::ComparisonBackend;
    use crate::error::{CompareError, Result};

    /// HTTP client for the backend's `/comparison/sessions/{id}/...` endpoints.
    #[derive(Clone)]
    pub struct HttpComparisonBackend {
        client: reqwest::Client,
        base_url: Url,
    }

    impl HttpComparisonBackend {
        /// `base_url` is the API root, e.g. `https://api.example.com/v1`.
        pub fn new(base_url: &str) -> Result<Self> {
            Self::with_client(base_url, reqwest::Client::new())
        }

        pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self> {
            let base_url = Url::parse(base_url.trim_end_matches('/'))
                .map_err(|e| CompareError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
            if base_url.cannot_be_a_base() {
                return Err(CompareError::InvalidBaseUrl(base_url.to_string()));
            }
            Ok(Self { client, base_url })
        }

        pub fn base_url(&self) -> &Url {
            &self.base_url
        }

        fn endpoint(&self, session_id: &str, leaf: &str) -> Result<Url> {
            let mut url = self.base_url.clone();
            url.path_segments_mut()
                .map_err(|_| CompareError::InvalidBaseUrl(self.base_url.to_string()))?
                .pop_if_empty()
                .extend(["comparison", "sessions", session_id, leaf]);
            Ok(url)
        }

        async fn get_json(&self, url: Url) -> Result<Value> {
            info!(url = %url, "requesting comparison backend");
            let resp = self.client.get(url).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(CompareError::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }
            Ok(resp.json().await?)
        }
    }

    #[async_trait]
    impl ComparisonBackend for HttpComparisonBackend {
        async fn session_results(&self, session_id: &str) -> Result<Value> {
            let url = self.endpoint(session_id, "results")?;
            self.get_json(url).await
        }

        async fn session_offers(&self, session_id: &str) -> Result<Value> {
            let url = self.endpoint(session_id, "offers")?;
            self.get_json(url).await
        }
    }

}
