//! # authweb
//!
//! Leptos + WASM account client: registration, login, logout, email
//! verification, and password-reset flows against a JSON/HTTP backend,
//! plus a protected dashboard.
//!
//! The heart of the crate is the session lifecycle — establish, persist,
//! recover, invalidate — implemented by the auth protocol engine
//! (`auth::engine`) over a policy-free transport (`net`). Views only ever
//! see the reactive read model in `state::auth`.

pub mod app;
pub mod auth;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
