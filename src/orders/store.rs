//! Order store trait: the persistence seam
//!
//! The service is agnostic to the underlying storage mechanism; every
//! backend implements [`OrderStore`]. The two mutation commands carry an
//! atomicity contract: each must apply its full effect (field set + trail
//! append + status sync) in a single storage operation, never as a
//! load-mutate-save sequence a concurrent writer could interleave with.

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::StorageError;
use crate::orders::model::{Order, OrderStatus};

/// Equality filter for order queries
///
/// Unset fields match everything. `statuses` restricts to a status set
/// (used for live-order queries).
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub customer: Option<Uuid>,
    pub vendor: Option<Uuid>,
    pub delivery_person: Option<Uuid>,
    pub statuses: Option<Vec<OrderStatus>>,
}

impl OrderFilter {
    pub fn for_customer(customer: Uuid) -> Self {
        Self {
            customer: Some(customer),
            ..Default::default()
        }
    }

    pub fn for_vendor(vendor: Uuid) -> Self {
        Self {
            vendor: Some(vendor),
            ..Default::default()
        }
    }

    pub fn for_delivery_person(delivery_person: Uuid) -> Self {
        Self {
            delivery_person: Some(delivery_person),
            ..Default::default()
        }
    }

    /// Restrict the filter to live (non-terminal) statuses
    pub fn live(mut self) -> Self {
        self.statuses = Some(OrderStatus::live_statuses().to_vec());
        self
    }

    /// Whether an order matches this filter
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(customer) = self.customer
            && order.customer != customer
        {
            return false;
        }
        if let Some(vendor) = self.vendor
            && order.vendor != vendor
        {
            return false;
        }
        if let Some(delivery_person) = self.delivery_person
            && order.delivery_person != Some(delivery_person)
        {
            return false;
        }
        if let Some(ref statuses) = self.statuses
            && !statuses.contains(&order.status)
        {
            return false;
        }
        true
    }
}

/// Persistence for order documents
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order; the caller builds it via [`Order::new`]
    async fn create(&self, order: Order) -> Result<Order, StorageError>;

    /// Fetch an order by id
    async fn get(&self, id: &Uuid) -> Result<Option<Order>, StorageError>;

    /// List orders matching the filter, newest first by `created_at`
    async fn find(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError>;

    /// Atomically append a tracking entry and set the canonical status
    /// to the same value. Returns the updated order, or `None` for an
    /// unknown id.
    async fn append_tracking(
        &self,
        id: &Uuid,
        status: OrderStatus,
        message: &str,
    ) -> Result<Option<Order>, StorageError>;

    /// Atomically set the delivery person and append a tracking entry
    /// carrying the order's current status. Returns the updated order,
    /// or `None` for an unknown id.
    async fn assign_delivery(
        &self,
        id: &Uuid,
        delivery_person: Uuid,
        message: &str,
    ) -> Result<Option<Order>, StorageError>;
}
