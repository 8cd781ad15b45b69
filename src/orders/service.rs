//! Order lifecycle service
//!
//! The only writer of order state. Every operation takes the
//! authenticated caller and enforces role and ownership rules before
//! touching the store; mutations go through the store's atomic commands
//! and publish an event on the bus after the commit. Reads return
//! populated views with user summaries and full products resolved from
//! the directory and catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::catalog::{Product, ProductCatalog, UserDirectory, UserSummary};
use crate::core::auth::{AuthContext, Role};
use crate::core::error::{AuthError, OrderError, ZiplyError, ZiplyResult};
use crate::core::events::{EventBus, EventScope, OrderEvent};
use crate::orders::model::{
    DeliveryAddress, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, TrackingUpdate,
};
use crate::orders::store::{OrderFilter, OrderStore};

/// Line item of a create-order request
///
/// Only the product reference and quantity are read; the price is
/// snapshotted from the live catalog, never taken from the client.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct OrderItemRequest {
    pub product: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
}

/// Payload of `POST /orders`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub vendor: Uuid,
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub special_instructions: Option<String>,
}

/// A line item with its product resolved
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub product: Option<Product>,
    pub quantity: u32,
    pub price: f64,
}

/// An order with its references resolved for API responses
///
/// Unresolvable references (a user or product no longer in the
/// directory/catalog) populate as `null` rather than failing the read.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: Uuid,
    pub customer: Option<UserSummary>,
    pub vendor: Option<UserSummary>,
    pub delivery_person: Option<UserSummary>,
    pub items: Vec<OrderItemView>,
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

/// Role-gated order lifecycle operations
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    products: Arc<dyn ProductCatalog>,
    users: Arc<dyn UserDirectory>,
    events: EventBus,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        products: Arc<dyn ProductCatalog>,
        users: Arc<dyn UserDirectory>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            products,
            users,
            events,
        }
    }

    /// Place a new order (customers only)
    ///
    /// Every referenced product must exist and be available; line-item
    /// prices are snapshotted from the catalog and `total_amount` is
    /// their sum.
    #[instrument(skip(self, request), fields(customer = %actor.user_id, vendor = %request.vendor))]
    pub async fn create_order(
        &self,
        actor: &AuthContext,
        request: CreateOrderRequest,
    ) -> ZiplyResult<OrderView> {
        if actor.role != Role::Customer {
            return Err(AuthError::not_authorized("create orders").into());
        }
        request.validate()?;

        let mut items = Vec::with_capacity(request.items.len());
        let mut total_amount = 0.0;
        for item in &request.items {
            let product = self
                .products
                .get(&item.product)
                .await?
                .filter(|p| p.is_available)
                .ok_or(OrderError::ProductUnavailable {
                    product_id: item.product,
                })?;
            total_amount += product.price * f64::from(item.quantity);
            items.push(OrderItem {
                product: product.id,
                quantity: item.quantity,
                price: product.price,
            });
        }

        let order = Order::new(
            actor.user_id,
            request.vendor,
            items,
            total_amount,
            request.delivery_address,
            request.payment_method,
            request.special_instructions,
        );
        let order = self.store.create(order).await?;
        info!(order_id = %order.id, total_amount, "order created");

        let view = self.populate(&order).await?;
        let payload = serde_json::to_value(&view)
            .map_err(|e| ZiplyError::Internal(format!("failed to encode order event: {}", e)))?;
        self.events.publish(
            scope_of(&order),
            OrderEvent::Created {
                order_id: order.id,
                order: payload,
            },
        );
        Ok(view)
    }

    /// List orders for a vendor (own orders) or delivery person
    /// (assigned orders); customers use [`Self::list_customer_orders`]
    pub async fn list_orders(&self, actor: &AuthContext) -> ZiplyResult<Vec<OrderView>> {
        let filter = match actor.role {
            Role::Vendor => OrderFilter::for_vendor(actor.user_id),
            Role::Delivery => OrderFilter::for_delivery_person(actor.user_id),
            Role::Customer => return Err(AuthError::not_authorized("list all orders").into()),
        };
        self.find_and_populate(&filter).await
    }

    /// List the calling customer's orders
    pub async fn list_customer_orders(&self, actor: &AuthContext) -> ZiplyResult<Vec<OrderView>> {
        if actor.role != Role::Customer {
            return Err(AuthError::not_authorized("list customer orders").into());
        }
        self.find_and_populate(&OrderFilter::for_customer(actor.user_id))
            .await
    }

    /// List the caller's orders still in progress (non-terminal statuses)
    pub async fn list_live_orders(&self, actor: &AuthContext) -> ZiplyResult<Vec<OrderView>> {
        let filter = match actor.role {
            Role::Vendor => OrderFilter::for_vendor(actor.user_id),
            Role::Delivery => OrderFilter::for_delivery_person(actor.user_id),
            Role::Customer => OrderFilter::for_customer(actor.user_id),
        };
        self.find_and_populate(&filter.live()).await
    }

    /// Fetch a single order
    ///
    /// Vendors and delivery people may view any order; a customer only
    /// their own.
    pub async fn get_order(&self, actor: &AuthContext, id: Uuid) -> ZiplyResult<OrderView> {
        let order = self
            .store
            .get(&id)
            .await?
            .ok_or(OrderError::NotFound { id })?;

        if actor.role == Role::Customer && order.customer != actor.user_id {
            return Err(AuthError::not_authorized("view this order").into());
        }
        self.populate(&order).await
    }

    /// Move an order to a new status
    ///
    /// The owning vendor or the assigned delivery person may transition
    /// an order; customers may not. The transition must be a valid
    /// lifecycle step.
    #[instrument(skip(self), fields(actor = %actor.user_id, role = %actor.role))]
    pub async fn update_status(
        &self,
        actor: &AuthContext,
        id: Uuid,
        new_status: OrderStatus,
    ) -> ZiplyResult<OrderView> {
        let order = self
            .store
            .get(&id)
            .await?
            .ok_or(OrderError::NotFound { id })?;

        match actor.role {
            Role::Vendor if order.vendor != actor.user_id => {
                return Err(AuthError::not_authorized("update this order").into());
            }
            Role::Delivery if order.delivery_person != Some(actor.user_id) => {
                return Err(AuthError::not_authorized("update this order").into());
            }
            Role::Customer => {
                return Err(AuthError::not_authorized("update this order").into());
            }
            _ => {}
        }

        if !order.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: new_status,
            }
            .into());
        }

        let message = format!("Order status updated to {}", new_status);
        let updated = self
            .store
            .append_tracking(&id, new_status, &message)
            .await?
            .ok_or(OrderError::NotFound { id })?;
        info!(order_id = %id, status = %new_status, "order status updated");

        self.events.publish(
            scope_of(&updated),
            OrderEvent::StatusChanged {
                order_id: id,
                status: new_status,
            },
        );
        self.populate(&updated).await
    }

    /// Assign a delivery person to an order (owning vendor only)
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn assign_delivery(
        &self,
        actor: &AuthContext,
        id: Uuid,
        delivery_person_id: Uuid,
    ) -> ZiplyResult<OrderView> {
        let order = self
            .store
            .get(&id)
            .await?
            .ok_or(OrderError::NotFound { id })?;

        if actor.role != Role::Vendor || order.vendor != actor.user_id {
            return Err(AuthError::not_authorized("update this order").into());
        }

        let updated = self
            .store
            .assign_delivery(&id, delivery_person_id, "Delivery person assigned")
            .await?
            .ok_or(OrderError::NotFound { id })?;
        info!(order_id = %id, delivery_person = %delivery_person_id, "delivery person assigned");

        self.events.publish(
            scope_of(&updated),
            OrderEvent::DeliveryAssigned {
                order_id: id,
                delivery_person_id,
            },
        );
        self.populate(&updated).await
    }

    async fn find_and_populate(&self, filter: &OrderFilter) -> ZiplyResult<Vec<OrderView>> {
        let orders = self.store.find(filter).await?;
        let mut views = Vec::with_capacity(orders.len());
        for order in &orders {
            views.push(self.populate(order).await?);
        }
        Ok(views)
    }

    /// Resolve user and product references into a response view
    async fn populate(&self, order: &Order) -> ZiplyResult<OrderView> {
        let customer = self.users.get(&order.customer).await?;
        let vendor = self.users.get(&order.vendor).await?;
        let delivery_person = match order.delivery_person {
            Some(id) => self.users.get(&id).await?,
            None => None,
        };

        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            items.push(OrderItemView {
                product: self.products.get(&item.product).await?,
                quantity: item.quantity,
                price: item.price,
            });
        }

        Ok(OrderView {
            id: order.id,
            customer,
            vendor,
            delivery_person,
            items,
            total_amount: order.total_amount,
            delivery_address: order.delivery_address.clone(),
            status: order.status,
            payment_status: order.payment_status,
            payment_method: order.payment_method,
            estimated_delivery_time: order.estimated_delivery_time,
            actual_delivery_time: order.actual_delivery_time,
            special_instructions: order.special_instructions.clone(),
            tracking_updates: order.tracking_updates.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

fn scope_of(order: &Order) -> EventScope {
    EventScope {
        customer: order.customer,
        vendor: order.vendor,
        delivery_person: order.delivery_person,
    }
}
