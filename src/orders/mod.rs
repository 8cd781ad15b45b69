//! Order domain: model, store seam, lifecycle service

pub mod model;
pub mod service;
pub mod store;

pub use model::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, TrackingUpdate};
pub use service::{CreateOrderRequest, OrderItemRequest, OrderService, OrderView};
pub use store::{OrderFilter, OrderStore};
