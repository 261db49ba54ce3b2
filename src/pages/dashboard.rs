//! Protected dashboard showing the authenticated user's profile.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;

use crate::auth::context::AuthContext;
use crate::components::auth_gate::RequireAuth;

/// Dashboard route — content is gated behind authentication.
#[component]
pub fn DashboardPage() -> impl IntoView {
    view! {
        <RequireAuth>
            <DashboardContent/>
        </RequireAuth>
    }
}

/// Profile card plus refresh and logout actions.
#[component]
fn DashboardContent() -> impl IntoView {
    let auth = expect_context::<AuthContext>();
    let state = auth.state;
    let error = RwSignal::new(Option::<String>::None);

    let on_logout = {
        let navigate = use_navigate();
        Callback::new(move |all_devices: bool| {
            let navigate = navigate.clone();
            leptos::task::spawn_local(async move {
                auth.logout(all_devices).await;
                navigate("/login", NavigateOptions::default());
            });
        })
    };

    let on_refresh = Callback::new(move |()| {
        error.set(None);
        leptos::task::spawn_local(async move {
            if let Err(err) = auth.refresh_user().await {
                error.set(Some(err.message));
            }
        });
    });

    view! {
        <div class="dashboard-page">
            <header class="dashboard-page__header">
                <h1>"Dashboard"</h1>
                <div class="dashboard-page__actions">
                    <button class="btn" on:click=move |_| on_refresh.run(())>
                        "Refresh"
                    </button>
                    <button class="btn" on:click=move |_| on_logout.run(false)>
                        "Logout"
                    </button>
                    <button class="btn" on:click=move |_| on_logout.run(true)>
                        "Logout everywhere"
                    </button>
                </div>
            </header>

            <Show when=move || error.get().is_some()>
                <div class="auth-page__error">{move || error.get().unwrap_or_default()}</div>
            </Show>

            {move || {
                state
                    .get()
                    .user
                    .map(|user| {
                        let verified = user.is_verified();
                        view! {
                            <div class="dashboard-page__card">
                                <h2>{user.name.clone()}</h2>
                                <p>{user.email.clone()}</p>
                                <p class="dashboard-page__badge">
                                    {if verified { "Email verified" } else { "Email not verified" }}
                                </p>
                            </div>
                        }
                    })
            }}
        </div>
    }
}
