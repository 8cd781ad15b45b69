//! WebSocket exposure: the scoped realtime order feed
//!
//! Replaces polling for order updates on the dashboards. Unlike a global
//! broadcast channel, every connection is authenticated at the upgrade
//! and only ever receives events whose scope names its identity (the
//! order's customer, its vendor, or the assigned delivery person).
//!
//! # Architecture
//!
//! ```text
//! Client ──ws──▶ /ws?token=… ──▶ ws_handler() ──▶ ConnectionManager
//!                                                      │
//!                                             subscribe(filter)
//!                                                      │
//!                      EventBus ──broadcast──▶ scope check ──▶ filter ──▶ Client
//! ```
//!
//! # Protocol
//!
//! Client → Server (JSON):
//! - `{"type": "subscribe", "filter": {"order_id": "…"}}`
//! - `{"type": "unsubscribe", "subscription_id": "…"}`
//! - `{"type": "ping"}`
//!
//! Server → Client (JSON):
//! - `{"type": "welcome", "connection_id": "…"}`
//! - `{"type": "event", "subscription_id": "…", "data": {…}}`
//! - `{"type": "subscribed", "subscription_id": "…"}`
//! - `{"type": "unsubscribed", "subscription_id": "…"}`
//! - `{"type": "pong"}`
//! - `{"type": "error", "message": "…"}`

mod handler;
mod manager;
pub mod protocol;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::core::auth::AuthProvider;
use crate::core::events::EventBus;

pub use manager::ConnectionManager;

/// State shared by the WebSocket handlers
#[derive(Clone)]
pub struct WsState {
    pub manager: Arc<ConnectionManager>,
    pub auth: Arc<dyn AuthProvider>,
}

/// Build the WebSocket router
///
/// Creates a `ConnectionManager` subscribed to the event bus, spawns
/// the dispatch loop, and returns a router with the `/ws` endpoint.
pub fn build_router(auth: Arc<dyn AuthProvider>, events: &EventBus) -> Router {
    let manager = Arc::new(ConnectionManager::new());

    let dispatch_manager = manager.clone();
    let rx = events.subscribe();
    tokio::spawn(async move {
        dispatch_manager.run_dispatch_loop(rx).await;
    });

    Router::new()
        .route("/ws", get(handler::ws_handler))
        .with_state(WsState { manager, auth })
}
