//! Reset-password page, reached from the emailed link with a `?token=`.

use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_query_map;

use crate::auth::context::AuthContext;

/// Reset-password page — sets a new password with the mailed token.
#[component]
pub fn ResetPasswordPage() -> impl IntoView {
    let auth = expect_context::<AuthContext>();
    let query = use_query_map();

    let password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let error = RwSignal::new(Option::<String>::None);
    let success = RwSignal::new(Option::<String>::None);
    let pending = RwSignal::new(false);

    let submit = Callback::new(move |()| {
        if pending.get_untracked() {
            return;
        }
        if password.get_untracked() != confirm.get_untracked() {
            error.set(Some("Passwords do not match".to_owned()));
            return;
        }
        let Some(token) = query.get_untracked().get("token").filter(|t| !t.is_empty()) else {
            error.set(Some("Invalid reset token".to_owned()));
            return;
        };
        error.set(None);
        success.set(None);
        pending.set(true);

        leptos::task::spawn_local(async move {
            let result = auth.reset_password(&token, &password.get_untracked()).await;
            pending.set(false);
            match result {
                Ok(message) => success.set(Some(message)),
                Err(err) => error.set(Some(err.message)),
            }
        });
    });

    view! {
        <div class="auth-page">
            <h2>"Reset Password"</h2>

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
                "New Password"
                <input
                    class="auth-page__input"
                    type="password"
                    prop:value=move || password.get()
                    on:input=move |ev| password.set(event_target_value(&ev))
                />
            </label>

            <label class="auth-page__label">
                "Confirm Password"
                <input
                    class="auth-page__input"
                    type="password"
                    prop:value=move || confirm.get()
                    on:input=move |ev| confirm.set(event_target_value(&ev))
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
                {move || if pending.get() { "Resetting..." } else { "Reset Password" }}
            </button>
        </div>
    }
}
