//! HTTP exposure: REST routes and the WebSocket event feed
//!
//! The REST and WebSocket exposures are built separately from the same
//! shared state and merged into one router; `main` binds the listener
//! and serves the result.

pub mod rest;
pub mod ws;

use axum::Router;
use axum::http::HeaderValue;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::core::auth::AuthProvider;
use crate::core::events::EventBus;
use crate::orders::OrderService;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub auth: Arc<dyn AuthProvider>,
    pub events: EventBus,
}

impl AppState {
    pub fn new(orders: Arc<OrderService>, auth: Arc<dyn AuthProvider>, events: EventBus) -> Self {
        Self {
            orders,
            auth,
            events,
        }
    }
}

/// Build the full application router: REST + WebSocket + middleware
pub fn build_router(state: AppState, cors: &CorsConfig) -> Router {
    let rest_router = rest::build_router(state.clone());
    let ws_router = ws::build_router(state.auth.clone(), &state.events);

    rest_router
        .merge(ws_router)
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the dashboard clients: scoped to the configured origin,
/// permissive otherwise
fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    match cors
        .allowed_origin
        .as_deref()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
    {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}
