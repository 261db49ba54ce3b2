//! Backend API configuration and endpoint paths.

/// Default request timeout, matching the backend contract.
pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

/// Base URL and timeout for the transport client.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: "/api".to_owned(), timeout_ms: DEFAULT_TIMEOUT_MS }
    }
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Absolute URL for an endpoint path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

/// Endpoint paths consumed by the client. These are backend contract, not
/// redesigned here; the base URL above is the only deployment knob.
pub mod endpoints {
    pub const REGISTER: &str = "/auth/register";
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const VERIFY_EMAIL: &str = "/auth/verify-email";
    pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
    pub const RESET_PASSWORD: &str = "/auth/reset-password";
    pub const CURRENT_USER: &str = "/auth/me";
    pub const CHECK_PERSISTENT: &str = "/auth/check-persistent-login";
}
