//! Protected-route gate.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::auth::context::AuthContext;

/// Renders children only for authenticated users.
///
/// Redirects to `/login` once the startup check has settled; never while
/// it is still loading, which would cause a flash-redirect on reload.
#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<AuthContext>();
    let state = auth.state;
    let navigate = use_navigate();

    Effect::new(move || {
        if state.get().should_redirect() {
            navigate("/login", NavigateOptions::default());
        }
    });

    view! {
        <Show
            when=move || state.get().is_authenticated()
            fallback=|| view! { <p class="gate-loading">"Checking session..."</p> }
        >
            {children()}
        </Show>
    }
}
