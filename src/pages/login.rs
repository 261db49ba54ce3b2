//! Login page with email/password form and remember-me persistent login.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::components::A;
use leptos_router::hooks::use_navigate;

use crate::auth::context::AuthContext;

/// Login page — authenticates and navigates to the dashboard on success.
/// Already-authenticated visitors are redirected immediately.
#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = expect_context::<AuthContext>();
    let state = auth.state;

    let navigate = use_navigate();
    Effect::new(move || {
        if state.get().is_authenticated() {
            navigate("/dashboard", NavigateOptions::default());
        }
    });

    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let remember_me = RwSignal::new(false);
    let error = RwSignal::new(Option::<String>::None);
    let pending = RwSignal::new(false);

    let submit = {
        let navigate = use_navigate();
        Callback::new(move |()| {
            if pending.get_untracked() {
                return;
            }
            error.set(None);
            pending.set(true);

            let navigate = navigate.clone();
            leptos::task::spawn_local(async move {
                let result = auth
                    .login(
                        email.get_untracked().trim(),
                        &password.get_untracked(),
                        remember_me.get_untracked(),
                    )
                    .await;
                pending.set(false);
                match result {
                    Ok(()) => navigate("/dashboard", NavigateOptions::default()),
                    Err(err) => error.set(Some(err.message)),
                }
            });
        })
    };

    view! {
        <div class="auth-page">
            <h2>"Login"</h2>

            <Show when=move || error.get().is_some()>
                <div class="auth-page__error">{move || error.get().unwrap_or_default()}</div>
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
                "Password"
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

            <label class="auth-page__checkbox">
                <input
                    type="checkbox"
                    prop:checked=move || remember_me.get()
                    on:change=move |ev| remember_me.set(event_target_checked(&ev))
                />
                "Remember me"
            </label>

            <button
                class="btn btn--primary"
                disabled=move || pending.get()
                on:click=move |_| submit.run(())
            >
                {move || if pending.get() { "Logging in..." } else { "Login" }}
            </button>

            <p class="auth-page__links">
                <A href="/forgot-password">"Forgot Password?"</A>
            </p>
            <p class="auth-page__links">
                "Don't have an account? " <A href="/register">"Register"</A>
            </p>
        </div>
    }
}
