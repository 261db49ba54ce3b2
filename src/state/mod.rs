//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! `session` owns the durable credential and is the only persisted state;
//! `auth` is the reactive read model views subscribe to. Keeping them
//! separate lets the protocol engine run (and be tested) without any UI.

pub mod auth;
pub mod session;
