//! Auth protocol engine.
//!
//! DESIGN
//! ======
//! The engine is the only place that mutates the session store; the
//! transport stays policy-free. Every operation goes through the injected
//! `Api` seam, so the whole state machine runs natively under test with a
//! scripted mock.
//!
//! Recovery through the persistent-login cookie is serialized behind one
//! shared in-flight future: N concurrent expired-session failures trigger
//! exactly one recovery call. The expired-session retry itself is capped
//! at depth 1 by the explicit `PendingRequest` attempt counter — never a
//! hidden flag on a shared request object.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use serde_json::json;

use crate::net::config::endpoints;
use crate::net::error::{ApiError, ErrorKind};
use crate::net::types::{Api, ApiRequest, Envelope, Method, User};
use crate::state::session::{EstablishedVia, Session, SessionStore, now_ms};

type RecoveryFuture = Shared<LocalBoxFuture<'static, Result<Session, ApiError>>>;

/// Outcome of `check_auth`: always a state, never an error.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthCheck {
    Authenticated(Session),
    Anonymous,
}

/// An outbound request captured for at most one expired-session retry.
/// Discarded after one retry regardless of outcome.
#[derive(Clone, Debug)]
struct PendingRequest {
    request: ApiRequest,
    attempt: u8,
}

/// Orchestrates login, registration, logout, email verification,
/// password reset, and session recovery over the transport seam.
#[derive(Clone)]
pub struct AuthEngine<A: Api> {
    api: A,
    store: SessionStore,
    recovery: Rc<RefCell<Option<RecoveryFuture>>>,
}

impl<A: Api> AuthEngine<A> {
    #[must_use]
    pub fn new(api: A, store: SessionStore) -> Self {
        Self { api, store, recovery: Rc::new(RefCell::new(None)) }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Register a new account.
    ///
    /// Never establishes a session: the address must be verified by email
    /// and the user logs in explicitly afterwards.
    ///
    /// # Errors
    ///
    /// Transport failures, plus backend rejections (duplicate email,
    /// validation) normalized into `ApiError`.
    pub async fn register(&self, email: &str, name: &str, password: &str) -> Result<Envelope, ApiError> {
        let body = json!({ "email": email, "name": name, "password": password });
        let envelope = self.api.send(ApiRequest::post(endpoints::REGISTER, body)).await?;
        if envelope.success {
            Ok(envelope)
        } else {
            Err(soft_failure(&envelope, "Registration failed"))
        }
    }

    /// Authenticate with credentials. On success the session store is set;
    /// on any failure it is left untouched. With `remember_me` the backend
    /// also sets the persistent-login cookie (opaque to this client).
    ///
    /// # Errors
    ///
    /// Invalid credentials and transport failures. A login 401 is a plain
    /// rejection — it never triggers recovery.
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> Result<Session, ApiError> {
        let body = json!({ "email": email, "password": password, "remember_me": remember_me });
        let envelope = self.api.send(ApiRequest::post(endpoints::LOGIN, body)).await?;
        let session = session_from_envelope(&envelope, EstablishedVia::Credentials)
            .ok_or_else(|| soft_failure(&envelope, "Login failed"))?;
        self.store.set(session.clone());
        Ok(session)
    }

    /// End the session. Local state is always cleared, even when the
    /// remote call fails: the user believes the session is terminated.
    pub async fn logout(&self, all_devices: bool) {
        let request = ApiRequest::post(endpoints::LOGOUT, json!({ "all_devices": all_devices }))
            .with_session(self.store.session_id());
        if let Err(err) = self.api.send(request).await {
            log::warn!("remote logout failed: {err}");
        }
        self.store.clear();
    }

    /// Verify an email address with the mailed token. Stateless with
    /// respect to the session; the updated verified flag is observed on
    /// the next `check_auth` or login.
    ///
    /// # Errors
    ///
    /// Invalid or expired tokens, and transport failures.
    pub async fn verify_email(&self, token: &str) -> Result<Envelope, ApiError> {
        let envelope = self
            .api
            .send(ApiRequest::post(endpoints::VERIFY_EMAIL, json!({ "token": token })))
            .await?;
        if envelope.success {
            Ok(envelope)
        } else {
            Err(soft_failure(&envelope, "Verification failed"))
        }
    }

    /// Request a password-reset email. The backend answers with the same
    /// ack whether or not the address exists; this client relays it
    /// without branching (enumeration resistance).
    ///
    /// # Errors
    ///
    /// Transport failures only, under the uniform-ack backend contract.
    pub async fn forgot_password(&self, email: &str) -> Result<Envelope, ApiError> {
        let envelope = self
            .api
            .send(ApiRequest::post(endpoints::FORGOT_PASSWORD, json!({ "email": email })))
            .await?;
        if envelope.success {
            Ok(envelope)
        } else {
            Err(soft_failure(&envelope, "Failed to send reset email"))
        }
    }

    /// Set a new password using the mailed reset token.
    ///
    /// # Errors
    ///
    /// Invalid or expired tokens, and transport failures.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<Envelope, ApiError> {
        let body = json!({ "token": token, "new_password": new_password });
        let envelope = self.api.send(ApiRequest::post(endpoints::RESET_PASSWORD, body)).await?;
        if envelope.success {
            Ok(envelope)
        } else {
            Err(soft_failure(&envelope, "Failed to reset password"))
        }
    }

    /// Single source of truth for session recovery, at startup and on
    /// demand.
    ///
    /// Order: validate any stored session against the backend (adopt on
    /// success, discard on rejection and fall through), then attempt
    /// persistent-login recovery, then declare anonymous. Network or
    /// server trouble resolves to anonymous without discarding the stored
    /// credential — fail safe, retried on the next start — and is logged
    /// rather than surfaced.
    pub async fn check_auth(&self) -> AuthCheck {
        if let Some(session) = self.store.get() {
            let request = ApiRequest::get(endpoints::CURRENT_USER)
                .with_session(Some(session.session_id.clone()));
            match self.api.send(request).await {
                Ok(envelope) => {
                    let user = envelope
                        .data
                        .as_ref()
                        .filter(|_| envelope.success)
                        .and_then(|data| serde_json::from_value::<User>(data.clone()).ok());
                    if let Some(user) = user {
                        let refreshed = Session { user, ..session };
                        self.store.set(refreshed.clone());
                        return AuthCheck::Authenticated(refreshed);
                    }
                    // Backend answered but rejected or garbled the session.
                    self.store.clear();
                }
                Err(err) if err.is_auth() => {
                    self.store.clear();
                }
                Err(err) => {
                    log::warn!("auth check failed: {err}");
                    return AuthCheck::Anonymous;
                }
            }
        }

        match self.recover().await {
            Ok(session) => AuthCheck::Authenticated(session),
            Err(err) => {
                if !err.is_auth() {
                    log::warn!("persistent login check failed: {err}");
                }
                AuthCheck::Anonymous
            }
        }
    }

    /// Exchange the persistent-login cookie for a fresh session.
    ///
    /// Single-flight: concurrent callers share one in-flight request. On
    /// success the new session is adopted and persisted; on failure the
    /// local session is cleared.
    pub fn recover(&self) -> RecoveryFuture {
        let mut slot = self.recovery.borrow_mut();
        if let Some(inflight) = slot.as_ref() {
            return inflight.clone();
        }

        let api = self.api.clone();
        let store = self.store.clone();
        let recovery = Rc::clone(&self.recovery);
        let future = async move {
            let result = recover_session(&api, &store).await;
            recovery.borrow_mut().take();
            result
        }
        .boxed_local()
        .shared();
        *slot = Some(future.clone());
        future
    }

    /// Authenticated request with the one-shot expired-session retry.
    ///
    /// An `Auth`-class failure on the first attempt awaits recovery; on
    /// success the request is resent exactly once with the new session
    /// id. A second `Auth` failure is terminal and clears the session. A
    /// failed recovery surfaces the recovery error (the stored session is
    /// already gone by then).
    ///
    /// # Errors
    ///
    /// Any transport failure other than the single recovered 401.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Envelope, ApiError> {
        let mut pending = PendingRequest {
            request: ApiRequest {
                method,
                path: path.to_owned(),
                body,
                session_id: self.store.session_id(),
            },
            attempt: 0,
        };

        loop {
            match self.api.send(pending.request.clone()).await {
                Ok(envelope) => return Ok(envelope),
                Err(err) if err.is_auth() && pending.attempt == 0 => {
                    let session = self.recover().await?;
                    pending.attempt = 1;
                    pending.request.session_id = Some(session.session_id);
                }
                Err(err) => {
                    if err.is_auth() {
                        self.store.clear();
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Re-fetch the current user through the retried request path and
    /// adopt the fresh snapshot.
    ///
    /// # Errors
    ///
    /// Transport failures and malformed profile payloads.
    pub async fn refresh_user(&self) -> Result<User, ApiError> {
        let envelope = self.request(Method::Get, endpoints::CURRENT_USER, None).await?;
        let user = envelope
            .data
            .as_ref()
            .filter(|_| envelope.success)
            .and_then(|data| serde_json::from_value::<User>(data.clone()).ok())
            .ok_or_else(|| soft_failure(&envelope, "Failed to load profile"))?;
        if let Some(session) = self.store.get() {
            self.store.set(Session { user: user.clone(), ..session });
        }
        Ok(user)
    }
}

async fn recover_session<A: Api>(api: &A, store: &SessionStore) -> Result<Session, ApiError> {
    // No Authorization header: the ambient cookie is the credential here.
    match api.send(ApiRequest::post(endpoints::CHECK_PERSISTENT, json!({}))).await {
        Ok(envelope) => {
            if let Some(session) = session_from_envelope(&envelope, EstablishedVia::PersistentCookie) {
                store.set(session.clone());
                return Ok(session);
            }
            store.clear();
            Err(ApiError::status(401, envelope.message_or("Persistent login rejected"), None))
        }
        Err(err) => {
            store.clear();
            Err(err)
        }
    }
}

/// Build a session from a `data: { session_id, user }` payload.
fn session_from_envelope(envelope: &Envelope, via: EstablishedVia) -> Option<Session> {
    if !envelope.success {
        return None;
    }
    let data = envelope.data.as_ref()?;
    let session_id = data.get("session_id")?.as_str()?.to_owned();
    let user: User = serde_json::from_value(data.get("user")?.clone()).ok()?;
    Some(Session { session_id, user, established_via: via, created_at: now_ms() })
}

/// A 2xx response the backend still marked unsuccessful, or a malformed
/// payload. The original status is kept rather than inventing one.
fn soft_failure(envelope: &Envelope, fallback: &str) -> ApiError {
    ApiError::status(200, envelope.message_or(fallback), None)
}
