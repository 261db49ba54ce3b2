//! Email-verification page, reached from the emailed link with a `?token=`.
//!
//! Verification is stateless with respect to the session: the updated
//! verified flag is observed on the next auth check or login.

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_query_map;

use crate::auth::context::AuthContext;

#[derive(Clone, Debug, PartialEq)]
enum VerifyStatus {
    Verifying,
    Success(String),
    Failed(String),
}

/// Email-verification page — submits the token automatically on mount.
#[component]
pub fn VerifyEmailPage() -> impl IntoView {
    let auth = expect_context::<AuthContext>();
    let query = use_query_map();

    let status = RwSignal::new(VerifyStatus::Verifying);
    let started = StoredValue::new(false);

    Effect::new(move || {
        if started.get_value() {
            return;
        }
        started.set_value(true);

        let Some(token) = query.get_untracked().get("token").filter(|t| !t.is_empty()) else {
            status.set(VerifyStatus::Failed("Invalid verification link".to_owned()));
            return;
        };

        leptos::task::spawn_local(async move {
            match auth.verify_email(&token).await {
                Ok(message) => status.set(VerifyStatus::Success(message)),
                Err(err) => status.set(VerifyStatus::Failed(err.message)),
            }
        });
    });

    view! {
        <div class="auth-page">
            <h2>"Email Verification"</h2>

            {move || match status.get() {
                VerifyStatus::Verifying => view! {
                    <p class="auth-page__hint">"Verifying your email..."</p>
                }
                    .into_any(),
                VerifyStatus::Success(message) => view! {
                    <div class="auth-page__success">
                        {message} " " <A href="/login">"Proceed to login"</A>
                    </div>
                }
                    .into_any(),
                VerifyStatus::Failed(message) => view! {
                    <div class="auth-page__error">{message}</div>
                }
                    .into_any(),
            }}
        </div>
    }
}
