//! Internal event system for real-time order notifications
//!
//! The EventBus decouples mutations (REST handlers via the order
//! service) from notifications (the WebSocket exposure). It uses
//! `tokio::sync::broadcast`: publishing is non-blocking and
//! fire-and-forget, slow receivers lag and drop events, and nothing is
//! replayed — clients reconcile over REST after (re)connecting.
//!
//! # Architecture
//!
//! ```text
//! OrderService ──▶ EventBus::publish() ──▶ broadcast channel ──▶ WebSocket dispatch
//! ```
//!
//! Every envelope carries an [`EventScope`] naming the parties the event
//! concerns, so the WebSocket layer can fan events out only to the
//! connections entitled to see them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::core::auth::{AuthContext, Role};
use crate::orders::model::OrderStatus;

/// Events emitted after committed order mutations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    /// A new order was placed; `order` is the populated order payload
    Created {
        order_id: Uuid,
        order: serde_json::Value,
    },
    /// The order's canonical status changed
    StatusChanged {
        order_id: Uuid,
        status: OrderStatus,
    },
    /// A delivery person was assigned to the order
    DeliveryAssigned {
        order_id: Uuid,
        delivery_person_id: Uuid,
    },
}

impl OrderEvent {
    /// The order this event relates to
    pub fn order_id(&self) -> Uuid {
        match self {
            OrderEvent::Created { order_id, .. }
            | OrderEvent::StatusChanged { order_id, .. }
            | OrderEvent::DeliveryAssigned { order_id, .. } => *order_id,
        }
    }

    /// The event kind name (created, status_changed, delivery_assigned)
    pub fn kind(&self) -> &'static str {
        match self {
            OrderEvent::Created { .. } => "created",
            OrderEvent::StatusChanged { .. } => "status_changed",
            OrderEvent::DeliveryAssigned { .. } => "delivery_assigned",
        }
    }
}

/// The parties an event concerns
///
/// Used by the WebSocket dispatch loop to decide which connections may
/// receive the event: the order's customer, its vendor, and the
/// assigned delivery person (if any).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventScope {
    pub customer: Uuid,
    pub vendor: Uuid,
    pub delivery_person: Option<Uuid>,
}

impl EventScope {
    /// Whether the authenticated caller is one of the concerned parties
    pub fn includes(&self, ctx: &AuthContext) -> bool {
        match ctx.role {
            Role::Customer => self.customer == ctx.user_id,
            Role::Vendor => self.vendor == ctx.user_id,
            Role::Delivery => self.delivery_person == Some(ctx.user_id),
        }
    }
}

/// Envelope wrapping an order event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// Parties entitled to receive the event
    pub scope: EventScope,
    /// The actual event
    pub event: OrderEvent,
}

impl EventEnvelope {
    pub fn new(scope: EventScope, event: OrderEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            scope,
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone (the sender is an Arc internally) and shareable across
/// tasks. Publishing never blocks and never fails: with no subscribers
/// the event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity bounds how many events a slow receiver may fall
    /// behind before it starts losing them (lagged).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Returns the number of receivers the event was delivered to.
    pub fn publish(&self, scope: EventScope, event: OrderEvent) -> usize {
        let envelope = EventEnvelope::new(scope, event);
        tracing::debug!(
            event_id = %envelope.id,
            kind = envelope.event.kind(),
            order_id = %envelope.event.order_id(),
            "publishing order event"
        );
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to future events; events published earlier are not seen
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Current number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
