//! # Ziply Order Service
//!
//! The order-lifecycle core of a B2B food-supply marketplace: customers
//! place orders with vendors, vendors confirm/prepare them and hand them
//! to delivery people, and all three dashboards follow progress live.
//!
//! ## Features
//!
//! - **Role-gated lifecycle**: customers create, vendors and assigned
//!   delivery people advance status, vendors assign delivery
//! - **Closed status machine**: statuses are a validated enum with an
//!   explicit transition relation; cancellation from any live state
//! - **Audit trail**: every transition appends an immutable tracking
//!   entry, kept atomically in sync with the canonical status
//! - **Price snapshotting**: line items capture the live catalog price
//!   at order time; totals are always the sum of the stored items
//! - **Scoped realtime feed**: authenticated WebSocket connections
//!   receive only the events for orders they are a party to
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ziply::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryOrderStore::new());
//! let catalog = Arc::new(InMemoryProductCatalog::new());
//! let directory = Arc::new(InMemoryUserDirectory::new());
//! let auth = Arc::new(StaticTokenAuthProvider::new());
//! let events = EventBus::new(1024);
//!
//! let orders = Arc::new(OrderService::new(store, catalog, directory, events.clone()));
//! let state = AppState::new(orders, auth, events);
//! let app = ziply::server::build_router(state, &CorsConfig::default());
//! // axum::serve(listener, app).await
//! ```

pub mod catalog;
pub mod config;
pub mod core;
pub mod orders;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthContext, AuthProvider, Role, StaticTokenAuthProvider},
        error::{ZiplyError, ZiplyResult},
        events::{EventBus, EventEnvelope, EventScope, OrderEvent},
    };

    // === Domain ===
    pub use crate::orders::{
        CreateOrderRequest, OrderFilter, OrderService, OrderStatus, OrderStore, OrderView,
    };

    // === Collaborators ===
    pub use crate::catalog::{
        InMemoryProductCatalog, InMemoryUserDirectory, Product, ProductCatalog, UserDirectory,
        UserSummary,
    };

    // === Storage ===
    pub use crate::storage::InMemoryOrderStore;

    // === Config ===
    pub use crate::config::{AppConfig, CorsConfig};

    // === Server ===
    pub use crate::server::AppState;

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
