//! # Relay Errors
//!
//! Every failure the relay can surface to a caller is a [`RelayError`]: an
//! HTTP status plus a human readable message. The [`ErrorKind`] records which
//! branch of the taxonomy produced it so callers and logs can tell a rejected
//! key apart from an exhausted poll budget without parsing messages.

#[cfg(feature = "server")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Category of a relay failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or incomplete caller input (400)
    Validation,
    /// Credentials rejected by the upstream provider (401)
    Auth,
    /// Upstream failure whose status is mirrored to the caller
    Upstream,
    /// Poll budget exhausted while the job was still pending (504)
    Timeout,
    /// Unexpected or unclassified failure (500)
    Internal,
}

/// The only error shape surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RelayError {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
}

impl RelayError {
    pub fn new(kind: ErrorKind, status: u16, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, 400, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, 401, message)
    }

    /// Upstream failure carrying the provider's own status code.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream, status, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, 504, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, 500, message)
    }

    /// True for statuses providers use to reject credentials.
    pub fn is_auth_status(status: u16) -> bool {
        status == 401 || status == 403
    }
}

#[cfg(feature = "server")]
impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status)
            .ok()
            .filter(|status| status.is_client_error() || status.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(serde_json::json!({ "message": self.message }));

        (status, body).into_response()
    }
}

/// Transport level failures never carry a provider status, so they all land
/// in the internal bucket with a message describing what went wrong.
impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::internal("Request timeout - upstream provider did not respond in time")
        } else if err.is_connect() {
            RelayError::internal("Connection failed - unable to reach upstream provider")
        } else if err.is_decode() {
            RelayError::internal(format!("Failed to decode upstream response: {}", err))
        } else {
            RelayError::internal(format!("Upstream request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::internal(format!("JSON error: {}", err))
    }
}
