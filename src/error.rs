//! User-facing error type shared by the connection, actions and triggers.
//!
//! Every failure leaves the plugin as a [`PluginError`] carrying a short
//! `cause`, an actionable `assistance` hint and optional raw `data`.

use std::future::Future;

use haloitsm_api::error::truncate_text;
use haloitsm_api::HaloError;
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::secrets::redact_log_details;

pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Longest message fragment echoed back in `assistance`.
const MAX_ASSISTANCE_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authentication,
    Upstream,
    Transport,
    ConnectionTest,
    Unexpected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{cause}: {assistance}")]
pub struct PluginError {
    pub kind: ErrorKind,
    pub cause: String,
    pub assistance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl PluginError {
    pub fn new(kind: ErrorKind, cause: impl Into<String>, assistance: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
            assistance: assistance.into(),
            data: None,
        }
    }

    /// Missing or malformed input, raised before any network call.
    pub fn validation(cause: impl Into<String>, assistance: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, cause, assistance)
    }

    pub fn unexpected(context: &str, message: impl AsRef<str>) -> Self {
        Self::new(
            ErrorKind::Unexpected,
            format!("{context}: unexpected error"),
            truncate_text(message.as_ref(), MAX_ASSISTANCE_CHARS),
        )
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Re-labels the error as a failed connection test, keeping its details.
    pub fn into_connection_test(self) -> Self {
        Self {
            kind: ErrorKind::ConnectionTest,
            ..self
        }
    }

    /// Translates an API client error, prefixing the cause with `context`.
    pub fn from_api(context: &str, err: HaloError) -> Self {
        match err {
            HaloError::Http { status, message } => {
                let hint = if message.trim().is_empty() {
                    "Unknown error".to_string()
                } else {
                    truncate_text(&message, MAX_ASSISTANCE_CHARS)
                };
                Self::new(
                    ErrorKind::Upstream,
                    format!("{context}: HTTP {} error", status.as_u16()),
                    format!("HaloITSM API returned an error: {hint}"),
                )
                .with_data(format!("Status: {}, Response: {}", status.as_u16(), message))
            }
            HaloError::Authentication(detail) => Self::new(
                ErrorKind::Authentication,
                "Failed to obtain OAuth2 token",
                "Check your client credentials and authorization server URL",
            )
            .with_data(detail),
            HaloError::Timeout(detail) => Self::new(
                ErrorKind::Transport,
                format!("{context}: request timeout"),
                "HaloITSM API did not respond in time. Check network connectivity and server URL.",
            )
            .with_data(detail),
            HaloError::Network(detail) => Self::new(
                ErrorKind::Transport,
                format!("{context}: request failed"),
                format!(
                    "Unable to connect to HaloITSM API: {}",
                    truncate_text(&detail, MAX_ASSISTANCE_CHARS)
                ),
            )
            .with_data(detail),
            HaloError::Configuration(detail) => Self::validation(
                "Invalid connection configuration",
                truncate_text(&detail, MAX_ASSISTANCE_CHARS),
            ),
            HaloError::InvalidRequest(detail) => {
                Self::validation(format!("{context}: invalid request"), detail)
            }
            other @ (HaloError::Serialization(_) | HaloError::Other(_)) => {
                Self::unexpected(context, other.to_string()).with_data(other.to_string())
            }
        }
    }
}

impl From<HaloError> for PluginError {
    fn from(err: HaloError) -> Self {
        PluginError::from_api("HaloITSM request failed", err)
    }
}

/// Errors that can be turned into a [`PluginError`] under a context label.
pub trait IntoPluginError {
    fn into_plugin_error(self, context: &str) -> PluginError;
}

impl IntoPluginError for PluginError {
    fn into_plugin_error(self, _context: &str) -> PluginError {
        self
    }
}

impl IntoPluginError for HaloError {
    fn into_plugin_error(self, context: &str) -> PluginError {
        PluginError::from_api(context, self)
    }
}

/// Awaits `operation`, passing plugin errors through unchanged and wrapping
/// API errors with `context`. Failures are logged once here.
pub async fn with_context<T, E, F>(context: &str, operation: F) -> PluginResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: IntoPluginError,
{
    operation.await.map_err(|err| {
        let err = err.into_plugin_error(context);
        error!("{}", redact_log_details(&format!("{context}: {err}")));
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use haloitsm_api::error::MAX_ERROR_BODY_CHARS;
    use haloitsm_api::StatusCode;

    fn http_error(body: &str) -> HaloError {
        HaloError::http(StatusCode::BAD_GATEWAY, body)
    }

    #[test]
    fn upstream_errors_carry_status_and_bounded_body() {
        let body = "e".repeat(1_000);
        let err = PluginError::from_api("Failed to get ticket", http_error(&body));

        assert_eq!(err.kind, ErrorKind::Upstream);
        assert_eq!(err.cause, "Failed to get ticket: HTTP 502 error");
        assert!(err.assistance.len() < 260);
        let data = err.data.expect("upstream errors keep diagnostics");
        assert!(data.starts_with("Status: 502, Response: "));
        assert!(data.len() <= MAX_ERROR_BODY_CHARS + 30);
    }

    #[test]
    fn authentication_errors_point_at_credentials() {
        let err = PluginError::from(HaloError::Authentication("invalid_client".into()));
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert!(err.assistance.contains("client credentials"));
        assert_eq!(err.data.as_deref(), Some("invalid_client"));
    }

    #[tokio::test]
    async fn with_context_keeps_plugin_errors_untouched() {
        let original = PluginError::validation("Missing ticket ID", "Please provide a valid ticket ID");
        let result: PluginResult<()> =
            with_context("Failed to close ticket", async { Err(original.clone()) }).await;
        assert_eq!(result.unwrap_err(), original);
    }

    #[tokio::test]
    async fn with_context_labels_api_errors() {
        let result: PluginResult<()> = with_context("Failed to search tickets", async {
            Err(HaloError::Timeout("deadline elapsed".into()))
        })
        .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
        assert_eq!(err.cause, "Failed to search tickets: request timeout");
    }

    #[test]
    fn serialization_errors_become_unexpected() {
        let err = PluginError::from_api("Failed to create ticket", HaloError::Serialization("bad".into()));
        assert_eq!(err.kind, ErrorKind::Unexpected);
        assert_eq!(err.cause, "Failed to create ticket: unexpected error");
    }
}
