//! REST API server for the PRNG lab
//!
//! This crate exposes the `prng_core` generator, period search, Cesàro π
//! estimation and randomness tests over HTTP, using the same request and
//! response shapes as the lab UI.

pub mod config;
pub mod routes;
pub mod server;

// Re-export the core crate for integration
pub use prng_core;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
