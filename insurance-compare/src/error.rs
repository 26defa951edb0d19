use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the comparison subsystem.
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("session id is required")]
    MissingSessionId,

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("invalid backend base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("server returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl CompareError {
    pub(crate) fn invalid_server_response() -> Self {
        Self::InvalidResponse("invalid server response".to_string())
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;
