//! Registration page.
//!
//! Registration never logs the user in: the success banner instructs
//! them to verify their email address first.

use leptos::prelude::*;
use leptos_router::components::A;

use crate::auth::context::AuthContext;

/// Registration page with name/email/password form.
#[component]
pub fn RegisterPage() -> impl IntoView {
    let auth = expect_context::<AuthContext>();

    let email = RwSignal::new(String::new());
    let name = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let error = RwSignal::new(Option::<String>::None);
    let success = RwSignal::new(Option::<String>::None);
    let pending = RwSignal::new(false);

    let submit = Callback::new(move |()| {
        if pending.get_untracked() {
            return;
        }
        if password.get_untracked().len() < 8 {
            error.set(Some("Password must be at least 8 characters".to_owned()));
            return;
        }
        error.set(None);
        success.set(None);
        pending.set(true);

        leptos::task::spawn_local(async move {
            let result = auth
                .register(
                    email.get_untracked().trim(),
                    name.get_untracked().trim(),
                    &password.get_untracked(),
                )
                .await;
            pending.set(false);
            match result {
                Ok(message) => success.set(Some(message)),
                Err(err) => error.set(Some(err.message)),
            }
        });
    });

    view! {
        <div class="auth-page">
            <h2>"Register"</h2>

            <Show when=move || error.get().is_some()>
                <div class="auth-page__error">{move || error.get().unwrap_or_default()}</div>
            </Show>
            <Show when=move || success.get().is_some()>
                <div class="auth-page__success">
                    {move || success.get().unwrap_or_default()}
                    " "
                    <A href="/login">"Proceed to login"</A>
                </div>
            </Show>

            <label class="auth-page__label">
                "Email"
                <input
                    class="auth-page__input"
                    type="email"
                    prop:value=move || email.get()
                    on:input=move |ev| email.set(event_target_value(&ev))
                />
            </label>

            <label class="auth-page__label">
                "Name"
                <input
                    class="auth-page__input"
                    type="text"
                    prop:value=move || name.get()
                    on:input=move |ev| name.set(event_target_value(&ev))
                />
            </label>

            <label class="auth-page__label">
                "Password (min 8 characters)"
                <input
                    class="auth-page__input"
                    type="password"
                    prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))
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
                {move || if pending.get() { "Registering..." } else { "Register" }}
            </button>

            <p class="auth-page__links">
                "Already have an account? " <A href="/login">"Login"</A>
            </p>
        </div>
    }
}
