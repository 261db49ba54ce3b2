//! Forgot-password page.
//!
//! The ack banner is the backend's uniform message: it reads the same
//! whether or not the address exists.

use leptos::prelude::*;
use leptos_router::components::A;

use crate::auth::context::AuthContext;

/// Forgot-password page — requests a reset email.
#[component]
pub fn ForgotPasswordPage() -> impl IntoView {
    let auth = expect_context::<AuthContext>();

    let email = RwSignal::new(String::new());
    let message = RwSignal::new(Option::<String>::None);
    let error = RwSignal::new(Option::<String>::None);
    let pending = RwSignal::new(false);

    let submit = Callback::new(move |()| {
        if pending.get_untracked() {
            return;
        }
        error.set(None);
        message.set(None);
        pending.set(true);

        leptos::task::spawn_local(async move {
            let result = auth.forgot_password(email.get_untracked().trim()).await;
            pending.set(false);
            match result {
                Ok(ack) => message.set(Some(ack)),
                Err(err) => error.set(Some(err.message)),
            }
        });
    });

    view! {
        <div class="auth-page">
            <h2>"Forgot Password"</h2>
            <p class="auth-page__hint">
                "Enter your email address and we'll send you a link to reset your password."
            </p>

            <Show when=move || error.get().is_some()>
                <div class="auth-page__error">{move || error.get().unwrap_or_default()}</div>
            </Show>
            <Show when=move || message.get().is_some()>
                <div class="auth-page__success">{move || message.get().unwrap_or_default()}</div>
            </Show>

            <label class="auth-page__label">
                "Email"
                <input
                    class="auth-page__input"
                    type="email"
                    prop:value=move || email.get()
                    on:input=move |ev| email.set(event_target_value(&ev))
                    on:keydown=move |ev: leptos::ev::KeyboardEvent| {
                        if ev.key() == "Enter" {
                            ev.prevent_default();
                            submit.run(());
                        }
                    }
                />
            </label>

            <button
                class="btn btn--primary"
                disabled=move || pending.get()
                on:click=move |_| submit.run(())
            >
                {move || if pending.get() { "Sending..." } else { "Send Reset Link" }}
            </button>

            <p class="auth-page__links">
                <A href="/login">"Back to login"</A>
            </p>
        </div>
    }
}
