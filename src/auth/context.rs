//! Injectable auth capability for the view tree.
//!
//! DESIGN
//! ======
//! `AuthContext` is a `Copy` handle holding only the reactive read model,
//! so event handlers and views (which must be `Send`) can capture it
//! freely. The protocol engine itself is `Rc`-based and lives in a
//! tab-wide slot that is only touched from inside `spawn_local` futures.
//! Tests never go through this slot: they construct `AuthEngine` directly
//! with an injected mock transport and in-memory store.
//!
//! Server-side (SSR) every operation is a stub returning a network-class
//! error, matching the transport stubs: auth is only meaningful in the
//! browser.

#![allow(clippy::unused_async)]

use leptos::prelude::*;

use crate::net::error::ApiError;
use crate::state::auth::AuthState;

#[cfg(feature = "hydrate")]
use crate::auth::engine::{AuthCheck, AuthEngine};
#[cfg(feature = "hydrate")]
use crate::net::config::ApiConfig;
#[cfg(feature = "hydrate")]
use crate::net::http::HttpClient;
#[cfg(feature = "hydrate")]
use crate::state::auth::AuthPhase;
#[cfg(feature = "hydrate")]
use crate::state::session::SessionStore;

#[cfg(feature = "hydrate")]
thread_local! {
    static ENGINE: std::cell::RefCell<Option<AuthEngine<HttpClient>>> =
        const { std::cell::RefCell::new(None) };
}

/// The tab-wide engine, created on first use. Engines are cheap handles;
/// all clones share the session store and the single-flight recovery slot.
#[cfg(feature = "hydrate")]
fn engine() -> AuthEngine<HttpClient> {
    ENGINE.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| {
                AuthEngine::new(HttpClient::new(ApiConfig::default()), SessionStore::browser())
            })
            .clone()
    })
}

/// One reactive read model plus the auth operations, provided once at the
/// app root and consumed anywhere below via `expect_context`.
#[derive(Clone, Copy)]
pub struct AuthContext {
    pub state: RwSignal<AuthState>,
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthContext {
    #[must_use]
    pub fn new() -> Self {
        Self { state: RwSignal::new(AuthState::default()) }
    }

    /// Create, provide as context, and hand back a handle.
    #[must_use]
    pub fn provide() -> Self {
        let ctx = Self::new();
        provide_context(ctx);
        ctx
    }

    /// Start the startup check: show any cached user optimistically, then
    /// reconcile against the backend (stale-while-revalidate).
    pub fn init(&self) {
        #[cfg(feature = "hydrate")]
        {
            let state = self.state;
            let engine = engine();

            // Mirror every store transition into the read model, so a
            // terminal 401 anywhere flips consuming views to anonymous.
            engine.store().subscribe(move |session| match session {
                Some(session) => {
                    let user = session.user.clone();
                    state.update(|auth| {
                        auth.user = Some(user);
                        auth.phase = AuthPhase::Authenticated;
                    });
                }
                None => state.update(|auth| {
                    auth.user = None;
                    auth.phase = AuthPhase::Anonymous;
                }),
            });

            let cached = engine.store().get();
            state.update(|auth| {
                auth.user = cached.map(|session| session.user);
                auth.phase = AuthPhase::Verifying;
            });

            leptos::task::spawn_local(async move {
                match engine.check_auth().await {
                    AuthCheck::Authenticated(session) => state.update(|auth| {
                        auth.user = Some(session.user);
                        auth.phase = AuthPhase::Authenticated;
                    }),
                    AuthCheck::Anonymous => state.update(|auth| {
                        auth.user = None;
                        auth.phase = AuthPhase::Anonymous;
                    }),
                }
            });
        }
    }

    /// Authenticate; the read model flips via the store subscription.
    ///
    /// # Errors
    ///
    /// Invalid credentials and transport failures, for the form to display.
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> Result<(), ApiError> {
        #[cfg(feature = "hydrate")]
        {
            engine().login(email, password, remember_me).await?;
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (email, password, remember_me);
            Err(stub_error())
        }
    }

    /// Register an account; returns the ack message for the banner.
    /// Registration never establishes a session — the address must be
    /// verified first.
    ///
    /// # Errors
    ///
    /// Duplicate email, validation rejections, transport failures.
    pub async fn register(&self, email: &str, name: &str, password: &str) -> Result<String, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            let envelope = engine().register(email, name, password).await?;
            Ok(envelope.message_or(
                "Registration successful! Please check your email to verify your account.",
            ))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (email, name, password);
            Err(stub_error())
        }
    }

    /// End the session; local state always clears.
    pub async fn logout(&self, all_devices: bool) {
        #[cfg(feature = "hydrate")]
        {
            engine().logout(all_devices).await;
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = all_devices;
        }
    }

    /// Verify an email token; returns the ack message.
    ///
    /// # Errors
    ///
    /// Invalid or expired tokens, transport failures.
    pub async fn verify_email(&self, token: &str) -> Result<String, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            let envelope = engine().verify_email(token).await?;
            Ok(envelope.message_or("Email verified successfully!"))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = token;
            Err(stub_error())
        }
    }

    /// Request a password-reset email; returns the uniform ack message.
    ///
    /// # Errors
    ///
    /// Transport failures.
    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            let envelope = engine().forgot_password(email).await?;
            Ok(envelope.message_or("Password reset link has been sent to your email"))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = email;
            Err(stub_error())
        }
    }

    /// Set a new password with a reset token; returns the ack message.
    ///
    /// # Errors
    ///
    /// Invalid or expired tokens, transport failures.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<String, ApiError> {
        #[cfg(feature = "hydrate")]
        {
            let envelope = engine().reset_password(token, new_password).await?;
            Ok(envelope.message_or("Password reset successful!"))
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (token, new_password);
            Err(stub_error())
        }
    }

    /// Re-fetch the current user through the retried request path.
    ///
    /// # Errors
    ///
    /// Transport failures; a terminal 401 also flips the read model to
    /// anonymous via the store subscription.
    pub async fn refresh_user(&self) -> Result<(), ApiError> {
        #[cfg(feature = "hydrate")]
        {
            engine().refresh_user().await?;
            Ok(())
        }
        #[cfg(not(feature = "hydrate"))]
        {
            Err(stub_error())
        }
    }
}

#[cfg(not(feature = "hydrate"))]
fn stub_error() -> ApiError {
    ApiError::network("not available on server")
}
