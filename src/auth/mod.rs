//! Session lifecycle: the protocol engine and its Leptos context wrapper.

pub mod context;
pub mod engine;
