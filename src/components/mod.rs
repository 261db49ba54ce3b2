//! Reusable view components.

pub mod auth_gate;
