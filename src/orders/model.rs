//! Order domain model
//!
//! The order is the central entity: a customer's request to a vendor for
//! a set of products, tracked through a status lifecycle to delivery or
//! cancellation. The canonical status lives on the order and is mirrored
//! by the trailing entry of the append-only tracking trail; the two are
//! only ever mutated together (see [`Order::apply_tracking`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of an order
///
/// `Delivered` and `Cancelled` are terminal. Transitions follow the
/// adjacency encoded in [`OrderStatus::can_transition_to`]; arbitrary
/// jumps are rejected at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    PickedUp,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The wire name of the status (snake_case)
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Statuses of an order still in progress
    pub fn live_statuses() -> &'static [OrderStatus] {
        &[
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::PickedUp,
        ]
    }

    /// Whether moving from `self` to `to` is a valid lifecycle step
    ///
    /// Cancellation is reachable from any non-terminal status; everything
    /// else advances one step along the fulfilment chain.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if to == OrderStatus::Cancelled {
            return true;
        }
        matches!(
            (self, to),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Confirmed, OrderStatus::Preparing)
                | (OrderStatus::Preparing, OrderStatus::Ready)
                | (OrderStatus::Ready, OrderStatus::PickedUp)
                | (OrderStatus::PickedUp, OrderStatus::Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "picked_up" => Ok(OrderStatus::PickedUp),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(other.to_string()),
        }
    }
}

/// Payment state of an order (no gateway integration; the field exists
/// for the dashboards)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Cod,
}

/// A single line item: product reference, quantity, and the catalog
/// price snapshotted at order time. The snapshot is never recomputed
/// from the live product price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: Uuid,
    pub quantity: u32,
    pub price: f64,
}

/// Free-form delivery address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
}

/// Immutable audit-trail entry recording a status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingUpdate {
    pub status: OrderStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// An order document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer: Uuid,
    pub vendor: Uuid,
    pub delivery_person: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub delivery_address: DeliveryAddress,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub special_instructions: Option<String>,
    pub tracking_updates: Vec<TrackingUpdate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order in the `pending` state with an empty tracking
    /// trail. `total_amount` must already be the sum of the line items.
    pub fn new(
        customer: Uuid,
        vendor: Uuid,
        items: Vec<OrderItem>,
        total_amount: f64,
        delivery_address: DeliveryAddress,
        payment_method: PaymentMethod,
        special_instructions: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer,
            vendor,
            delivery_person: None,
            items,
            total_amount,
            delivery_address,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::default(),
            payment_method,
            estimated_delivery_time: None,
            actual_delivery_time: None,
            special_instructions,
            tracking_updates: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a tracking entry and set the canonical status to the same
    /// value, as one conceptual operation. Also stamps the delivery time
    /// when the order reaches `delivered`.
    ///
    /// Callers (the store) must invoke this inside a single critical
    /// section so concurrent transitions cannot interleave.
    pub fn apply_tracking(&mut self, status: OrderStatus, message: impl Into<String>) {
        let now = Utc::now();
        self.tracking_updates.push(TrackingUpdate {
            status,
            message: message.into(),
            timestamp: now,
        });
        self.status = status;
        if status == OrderStatus::Delivered {
            self.actual_delivery_time = Some(now);
        }
        self.updated_at = now;
    }

    /// Assign a delivery person, recording the assignment in the
    /// tracking trail without changing the canonical status.
    pub fn assign_delivery_person(&mut self, delivery_person: Uuid, message: impl Into<String>) {
        let now = Utc::now();
        self.delivery_person = Some(delivery_person);
        self.tracking_updates.push(TrackingUpdate {
            status: self.status,
            message: message.into(),
            timestamp: now,
        });
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            vec![OrderItem {
                product: Uuid::new_v4(),
                quantity: 2,
                price: 50.0,
            }],
            100.0,
            DeliveryAddress::default(),
            PaymentMethod::Cash,
            None,
        )
    }

    #[test]
    fn test_new_order_defaults() {
        let order = sample_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.tracking_updates.is_empty());
        assert!(order.delivery_person.is_none());
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.created_at, order.updated_at);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(OrderStatus::PickedUp.as_str(), "picked_up");
        assert_eq!(
            serde_json::to_value(OrderStatus::PickedUp).unwrap(),
            serde_json::json!("picked_up")
        );
        assert_eq!("picked_up".parse::<OrderStatus>(), Ok(OrderStatus::PickedUp));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_forward_chain_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition_to(OrderStatus::PickedUp));
        assert!(OrderStatus::PickedUp.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_no_skipping_ahead() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Ready));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::PickedUp));
    }

    #[test]
    fn test_no_going_backwards() {
        assert!(!OrderStatus::Ready.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::PickedUp.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_cancel_from_any_live_status() {
        for status in OrderStatus::live_statuses() {
            assert!(
                status.can_transition_to(OrderStatus::Cancelled),
                "{} should be cancellable",
                status
            );
        }
    }

    #[test]
    fn test_terminal_statuses_are_frozen() {
        for to in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Delivered.can_transition_to(to));
            assert!(!OrderStatus::Cancelled.can_transition_to(to));
        }
    }

    #[test]
    fn test_live_statuses_excludes_terminal() {
        let live = OrderStatus::live_statuses();
        assert_eq!(live.len(), 5);
        assert!(!live.contains(&OrderStatus::Delivered));
        assert!(!live.contains(&OrderStatus::Cancelled));
    }

    #[test]
    fn test_apply_tracking_keeps_status_and_trail_in_sync() {
        let mut order = sample_order();
        order.apply_tracking(OrderStatus::Confirmed, "Order status updated to confirmed");
        order.apply_tracking(OrderStatus::Preparing, "Order status updated to preparing");

        assert_eq!(order.status, OrderStatus::Preparing);
        let last = order.tracking_updates.last().unwrap();
        assert_eq!(last.status, OrderStatus::Preparing);
        assert_eq!(last.message, "Order status updated to preparing");
        assert_eq!(order.tracking_updates.len(), 2);
    }

    #[test]
    fn test_delivered_stamps_actual_delivery_time() {
        let mut order = sample_order();
        assert!(order.actual_delivery_time.is_none());
        order.apply_tracking(OrderStatus::Delivered, "Order status updated to delivered");
        assert!(order.actual_delivery_time.is_some());
    }

    #[test]
    fn test_assign_delivery_person_preserves_status() {
        let mut order = sample_order();
        let courier = Uuid::new_v4();
        order.assign_delivery_person(courier, "Delivery person assigned");

        assert_eq!(order.delivery_person, Some(courier));
        assert_eq!(order.status, OrderStatus::Pending);
        let last = order.tracking_updates.last().unwrap();
        assert_eq!(last.status, OrderStatus::Pending);
        assert_eq!(last.message, "Delivery person assigned");
    }

    #[test]
    fn test_order_serialization_roundtrip() {
        let order = sample_order();
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, order.id);
        assert_eq!(back.status, OrderStatus::Pending);
        assert_eq!(back.items, order.items);
    }
}
