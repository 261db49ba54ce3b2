//! Structured transport errors.
//!
//! Every backend call resolves to either an `Envelope` or an `ApiError`;
//! callers never see raw fetch failures. The taxonomy drives recovery
//! policy: only `Auth`-class errors are ever recovered from locally.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use thiserror::Error;

/// Broad classification of a transport failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response received: connection failure or timeout.
    Network,
    /// 4xx rejection with caller-fixable input (or a soft `success: false`).
    Validation,
    /// 401/403 — invalid, expired, or insufficient credentials.
    Auth,
    /// 409 — e.g. duplicate email on register.
    Conflict,
    /// 5xx — backend fault.
    Server,
}

/// The single structured failure channel for all backend calls.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status; 0 when no response was received.
    pub status: u16,
    /// Human-readable message, displayed verbatim by forms.
    pub message: String,
    /// Raw response body, when one was received.
    pub body: Option<serde_json::Value>,
}

impl ApiError {
    /// No response received.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self { status: 0, message: message.into(), body: None }
    }

    /// The fixed request timeout elapsed.
    #[must_use]
    pub fn timeout() -> Self {
        Self { status: 408, message: "Request timeout".to_owned(), body: None }
    }

    /// A response was received with a failure status.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self { status, message: message.into(), body }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.status {
            0 | 408 => ErrorKind::Network,
            401 | 403 => ErrorKind::Auth,
            409 => ErrorKind::Conflict,
            status if status >= 500 => ErrorKind::Server,
            _ => ErrorKind::Validation,
        }
    }

    #[must_use]
    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }
}
