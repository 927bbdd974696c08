//! Typed client surface
//!
//! The public entry point: one async method per access pattern, an
//! explicitly constructed execution context with caller-scoped
//! lifetime.

mod client;
mod options;

pub use client::Client;
pub use options::ClientOptions;
