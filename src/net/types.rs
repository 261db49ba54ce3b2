//! Wire types shared by the transport and the auth protocol engine.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

use crate::net::error::ApiError;

/// Authenticated user snapshot as returned by the backend.
///
/// Immutable on the client: replaced wholesale on re-authentication,
/// never field-patched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub email_verified_at: Option<String>,
}

impl User {
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// Uniform `{success, message, data}` response shape all endpoints return.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// Lenient parse: missing fields default, non-envelope bodies yield an
    /// unsuccessful empty envelope.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Backend message, or the given fallback when none was sent.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_owned()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One outbound request. The session id, when present, is sent as an
/// opaque `Authorization` header value; cookies ride along regardless.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub session_id: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self { method: Method::Get, path: path.to_owned(), body: None, session_id: None }
    }

    #[must_use]
    pub fn post(path: &str, body: serde_json::Value) -> Self {
        Self { method: Method::Post, path: path.to_owned(), body: Some(body), session_id: None }
    }

    #[must_use]
    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }
}

/// Transport seam between the protocol engine and the network.
///
/// Implemented by `HttpClient` in the browser and by scripted mocks in
/// tests. No `Send` bound: the client is single-threaded WASM.
#[allow(async_fn_in_trait)]
pub trait Api: Clone + 'static {
    async fn send(&self, request: ApiRequest) -> Result<Envelope, ApiError>;
}
