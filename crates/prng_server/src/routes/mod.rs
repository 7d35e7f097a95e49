//! Route modules for the PRNG lab server
//!
//! This module contains endpoint group-specific routers:
//! - lab: generator, period, Cesàro, randomness and export endpoints
//! - health: Health check and monitoring endpoints

pub mod health;
pub mod lab;

use axum::Router;
use prng_core::PrngService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Request façade bound to the configured limits
    pub service: Arc<PrngService>,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create a new AppState
    pub fn new(config: Arc<ServerConfig>) -> Self {
        let service = Arc::new(PrngService::new(config.limits));
        Self {
            config,
            service,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the main application router by merging all route modules
pub fn build_router(config: Arc<ServerConfig>) -> Router {
    let state = AppState::new(config);

    // The lab UI is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::routes())
        .merge(lab::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
