//! HTTP transport for the auth backend.
//!
//! DESIGN
//! ======
//! The transport is policy-free: it attaches credentials, enforces the
//! request timeout, and normalizes every outcome into the `{success,
//! message, data}` envelope or a structured `ApiError`. What a response
//! means for the local session is decided one layer up, in the auth
//! protocol engine.

pub mod config;
pub mod error;
pub mod http;
pub mod types;
