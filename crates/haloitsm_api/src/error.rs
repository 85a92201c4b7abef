//! Error model used by HaloITSM API client operations.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HaloError>;

/// Upper bound for response bodies carried inside errors.
pub const MAX_ERROR_BODY_CHARS: usize = 500;

/// Represents the failure modes of a HaloITSM API interaction: HTTP errors with status and body, token acquisition failures, timeouts, transport failures, payload (de)serialization problems and invalid client configuration or requests.
#[derive(Debug, Error)]
pub enum HaloError {
    #[error("http {status}: {message}")]
    Http { status: StatusCode, message: String },
    #[error("authentication error: {0}")]
    Authentication(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl HaloError {
    /// Constructs an HTTP error variant, bounding the carried body.
    pub fn http(status: StatusCode, body: &str) -> Self {
        HaloError::Http {
            status,
            message: truncate_text(body, MAX_ERROR_BODY_CHARS),
        }
    }

    /// Returns the HTTP status when the error came from a non-2xx response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HaloError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request executor may attempt the call again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HaloError::Http { .. } | HaloError::Timeout(_) | HaloError::Network(_) | HaloError::Other(_)
        )
    }
}

/// Keeps at most `limit` characters of `value`.
pub fn truncate_text(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

impl From<reqwest::Error> for HaloError {
    /// Converts reqwest errors into semantic HaloError variants.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HaloError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            HaloError::http(status, &err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            HaloError::Network(err.to_string())
        } else if err.is_decode() {
            HaloError::Serialization(err.to_string())
        } else {
            HaloError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HaloError {
    /// Converts serde_json decode/encode failures into serialization errors.
    fn from(err: serde_json::Error) -> Self {
        HaloError::Serialization(err.to_string())
    }
}
