//! gloo-net implementation of the transport seam.
//!
//! Client-side (hydrate): real HTTP calls with cookies included, the
//! session id as an `Authorization` header, and a fixed timeout.
//! Server-side (SSR): stub returning a network-class error, since these
//! endpoints are only meaningful in the browser.

use crate::net::config::ApiConfig;
use crate::net::error::ApiError;
use crate::net::types::{Api, ApiRequest, Envelope};

#[cfg(feature = "hydrate")]
use crate::net::types::Method;

/// HTTP transport for the auth backend.
#[derive(Clone, Debug)]
pub struct HttpClient {
    config: ApiConfig,
}

impl HttpClient {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Api for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<Envelope, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            send_browser(&self.config, request).await
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = request;
            Err(ApiError::network("not available on server"))
        }
    }
}

#[cfg(feature = "hydrate")]
async fn send_browser(config: &ApiConfig, request: ApiRequest) -> Result<Envelope, ApiError> {
    use futures::future::{Either, select};

    let url = config.url(&request.path);
    let mut builder = match request.method {
        Method::Get => gloo_net::http::Request::get(&url),
        Method::Post => gloo_net::http::Request::post(&url),
    };

    // Cookies always ride along; the persistent-login endpoint depends on it.
    builder = builder.credentials(web_sys::RequestCredentials::Include);
    if let Some(session_id) = &request.session_id {
        builder = builder.header("Authorization", session_id);
    }

    let built = match &request.body {
        Some(body) => builder.json(body),
        None => builder.build(),
    }
    .map_err(|e| ApiError::network(e.to_string()))?;

    let timeout = gloo_timers::future::sleep(std::time::Duration::from_millis(u64::from(
        config.timeout_ms,
    )));
    let response = match select(Box::pin(built.send()), Box::pin(timeout)).await {
        Either::Left((result, _)) => result.map_err(|e| ApiError::network(e.to_string()))?,
        Either::Right(((), _)) => return Err(ApiError::timeout()),
    };

    let status = response.status();
    let value = response
        .json::<serde_json::Value>()
        .await
        .unwrap_or(serde_json::Value::Null);
    let envelope = Envelope::from_value(&value);

    if (200..300).contains(&status) {
        Ok(envelope)
    } else {
        let message = envelope.message_or("Request failed");
        let body = (!value.is_null()).then_some(value);
        Err(ApiError::status(status, message, body))
    }
}
