//! Connection manager for WebSocket clients
//!
//! Tracks all active connections, their authenticated identities, and
//! their subscriptions. When an event arrives from the `EventBus`, it is
//! fanned out only to connections whose identity is inside the event's
//! scope and whose subscription filter matches.
//!
//! # Architecture
//!
//! ```text
//! EventBus ──recv──▶ ConnectionManager::run_dispatch_loop()
//!                          │
//!                    for each connection
//!                          │
//!                    scope.includes(identity)?
//!                          │
//!                    for each subscription
//!                          │
//!                    filter.matches(event)?
//!                          │
//!                    ──yes──▶ send to client via mpsc channel
//! ```

use super::protocol::{ServerMessage, Subscription, SubscriptionFilter};
use crate::core::auth::AuthContext;
use crate::core::events::EventEnvelope;
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

/// A handle to a single WebSocket connection
struct ConnectionHandle {
    /// The authenticated caller behind the connection
    identity: AuthContext,
    /// Sender to push ServerMessage to the client's write loop
    tx: mpsc::UnboundedSender<ServerMessage>,
    /// Active subscriptions for this connection
    subscriptions: Vec<Subscription>,
}

/// Manages all active WebSocket connections and their subscriptions
///
/// Thread-safe via `RwLock` — reads (dispatch) are frequent, writes
/// (connect/disconnect/subscribe) are infrequent.
#[derive(Default)]
pub struct ConnectionManager {
    connections: RwLock<HashMap<String, ConnectionHandle>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new authenticated connection
    ///
    /// Returns (connection_id, receiver); the receiver yields the
    /// `ServerMessage`s to forward to the client.
    pub async fn connect(
        &self,
        identity: AuthContext,
    ) -> (String, mpsc::UnboundedReceiver<ServerMessage>) {
        let connection_id = format!("conn_{}", Uuid::new_v4().simple());
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = ConnectionHandle {
            identity,
            tx,
            subscriptions: Vec::new(),
        };
        self.connections
            .write()
            .await
            .insert(connection_id.clone(), handle);

        tracing::debug!(
            connection_id = %connection_id,
            user_id = %identity.user_id,
            role = %identity.role,
            "WebSocket client connected"
        );
        (connection_id, rx)
    }

    /// Remove a connection when the client disconnects
    pub async fn disconnect(&self, connection_id: &str) {
        self.connections.write().await.remove(connection_id);
        tracing::debug!(connection_id = %connection_id, "WebSocket client disconnected");
    }

    /// Add a subscription to a connection, returning its ID
    pub async fn subscribe(
        &self,
        connection_id: &str,
        filter: SubscriptionFilter,
    ) -> Result<String, String> {
        let mut connections = self.connections.write().await;
        let conn = connections
            .get_mut(connection_id)
            .ok_or_else(|| format!("Connection {} not found", connection_id))?;

        let subscription = Subscription::new(filter);
        let sub_id = subscription.id.clone();
        conn.subscriptions.push(subscription);
        Ok(sub_id)
    }

    /// Remove a subscription; returns `true` if it existed
    pub async fn unsubscribe(
        &self,
        connection_id: &str,
        subscription_id: &str,
    ) -> Result<bool, String> {
        let mut connections = self.connections.write().await;
        let conn = connections
            .get_mut(connection_id)
            .ok_or_else(|| format!("Connection {} not found", connection_id))?;

        let before = conn.subscriptions.len();
        conn.subscriptions.retain(|s| s.id != subscription_id);
        Ok(conn.subscriptions.len() < before)
    }

    /// Send a message to a specific connection
    pub async fn send_to(&self, connection_id: &str, message: ServerMessage) {
        let connections = self.connections.read().await;
        if let Some(conn) = connections.get(connection_id) {
            // If send fails, the receiver is dropped (client disconnected)
            let _ = conn.tx.send(message);
        }
    }

    /// Dispatch an event to entitled, matching subscriptions
    ///
    /// The event's scope gates on the connection identity first; the
    /// per-subscription filter can only narrow within that.
    async fn dispatch_event(&self, envelope: &EventEnvelope) {
        let connections = self.connections.read().await;

        for (connection_id, handle) in connections.iter() {
            if !envelope.scope.includes(&handle.identity) {
                continue;
            }
            for subscription in &handle.subscriptions {
                if subscription.filter.matches(envelope) {
                    let message = ServerMessage::Event {
                        subscription_id: subscription.id.clone(),
                        data: envelope.clone(),
                    };
                    if handle.tx.send(message).is_err() {
                        tracing::debug!(
                            connection_id = %connection_id,
                            "Failed to send event to connection (likely disconnected)"
                        );
                        break; // Dead connection; skip its other subscriptions
                    }
                }
            }
        }
    }

    /// Run the event dispatch loop
    ///
    /// Continuously receives events from the `EventBus` broadcast
    /// channel and dispatches them. Spawn as a background task; exits
    /// when the bus is dropped.
    pub async fn run_dispatch_loop(&self, mut rx: broadcast::Receiver<EventEnvelope>) {
        tracing::info!("WebSocket dispatch loop started");

        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    self.dispatch_event(&envelope).await;
                }
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    // Lagged is not fatal; clients reconcile over REST
                    tracing::warn!(count, "WebSocket dispatch loop lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("EventBus closed, stopping WebSocket dispatch loop");
                    break;
                }
            }
        }
    }

    /// Number of active connections (for monitoring)
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
