//! WebSocket message protocol definitions
//!
//! JSON messages exchanged between dashboard clients and the server.
//!
//! ## Client → Server Messages
//!
//! ```json
//! // Subscribe to order events (optionally narrowed)
//! {"type": "subscribe", "filter": {"order_id": "...", "event": "status_changed"}}
//!
//! // Unsubscribe
//! {"type": "unsubscribe", "subscription_id": "sub_abc123"}
//!
//! // Keepalive
//! {"type": "ping"}
//! ```
//!
//! ## Server → Client Messages
//!
//! ```json
//! // Event notification
//! {"type": "event", "subscription_id": "sub_abc123", "data": {...}}
//!
//! // Subscription confirmed
//! {"type": "subscribed", "subscription_id": "sub_abc123", "filter": {...}}
//!
//! // Unsubscription confirmed
//! {"type": "unsubscribed", "subscription_id": "sub_abc123"}
//!
//! // Keepalive response
//! {"type": "pong"}
//!
//! // Error
//! {"type": "error", "message": "Invalid subscription filter"}
//! ```
//!
//! The filter can only narrow what a connection receives; the party
//! scope (which orders the caller is entitled to see at all) comes from
//! the authenticated identity and is enforced by the connection
//! manager, never by client input.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::events::EventEnvelope;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to events matching a filter
    Subscribe { filter: SubscriptionFilter },
    /// Unsubscribe from a specific subscription
    Unsubscribe { subscription_id: String },
    /// Keepalive ping
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// An event matching a subscription
    Event {
        subscription_id: String,
        data: EventEnvelope,
    },
    /// Subscription confirmation
    Subscribed {
        subscription_id: String,
        filter: SubscriptionFilter,
    },
    /// Unsubscription confirmation
    Unsubscribed { subscription_id: String },
    /// Keepalive response
    Pong,
    /// Error message
    Error { message: String },
    /// Welcome message on connection
    Welcome { connection_id: String },
}

/// Filter criteria for event subscriptions
///
/// All fields are optional; `None` acts as a wildcard. A connection only
/// ever sees events scoped to its own identity regardless of the filter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubscriptionFilter {
    /// Restrict to a single order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,

    /// Restrict by event kind: "created", "status_changed",
    /// "delivery_assigned"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl SubscriptionFilter {
    /// Check whether an envelope passes this filter
    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        if let Some(order_id) = self.order_id
            && envelope.event.order_id() != order_id
        {
            return false;
        }
        if let Some(ref event) = self.event
            && envelope.event.kind() != event
        {
            return false;
        }
        true
    }
}

/// A subscription with its filter and a unique ID
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: String,
    pub filter: SubscriptionFilter,
}

impl Subscription {
    pub fn new(filter: SubscriptionFilter) -> Self {
        Self {
            id: format!("sub_{}", Uuid::new_v4().simple()),
            filter,
        }
    }
}
