//! Relay error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Terminal outcome of a rejected request.
///
/// The `Display` text is the exact plain-text body sent to the client.
/// Decode and parse causes are kept as sources for logging only.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Cookie not found")]
    CookieNotFound,

    #[error("Cookie value does not start with 'base64-'")]
    MissingPrefix,

    #[error("Failed to decode cookie value")]
    InvalidBase64(#[source] base64::DecodeError),

    #[error("Failed to parse JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("No valid access_token found")]
    InvalidToken,
}

impl RelayError {
    /// Status code paired with this rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::CookieNotFound | RelayError::InvalidToken => StatusCode::UNAUTHORIZED,
            RelayError::MissingPrefix
            | RelayError::InvalidBase64(_)
            | RelayError::InvalidJson(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::CookieNotFound => "cookie_not_found",
            RelayError::MissingPrefix => "missing_prefix",
            RelayError::InvalidBase64(_) => "invalid_base64",
            RelayError::InvalidJson(_) => "invalid_json",
            RelayError::InvalidToken => "invalid_token",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Rejected relay configuration. Raised at chain assembly, never per request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRelayConfig {
    #[error("cookieName cannot be empty")]
    EmptyCookieName,
}
