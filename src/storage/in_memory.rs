//! In-memory implementation of OrderStore for testing and development
//!
//! Every mutation runs inside a single write-lock critical section, so
//! the push-and-set of `append_tracking` and the set-and-push of
//! `assign_delivery` are atomic with respect to concurrent callers:
//! `status` and the trailing tracking entry can never be observed out of
//! sync.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::StorageError;
use crate::orders::model::{Order, OrderStatus};
use crate::orders::store::{OrderFilter, OrderStore};

/// In-memory order store
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders (for monitoring and tests)
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order) -> Result<Order, StorageError> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Order>, StorageError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();
        // Newest first; tie-break on id for a stable order
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(matching)
    }

    async fn append_tracking(
        &self,
        id: &Uuid,
        status: OrderStatus,
        message: &str,
    ) -> Result<Option<Order>, StorageError> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(id).map(|order| {
            order.apply_tracking(status, message);
            order.clone()
        }))
    }

    async fn assign_delivery(
        &self,
        id: &Uuid,
        delivery_person: Uuid,
        message: &str,
    ) -> Result<Option<Order>, StorageError> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(id).map(|order| {
            order.assign_delivery_person(delivery_person, message);
            order.clone()
        }))
    }
}
