//! Boundary collaborators: product catalog and user directory
//!
//! Products and users are owned by other parts of the platform; the
//! order service only reads the handful of fields it needs (price and
//! availability for products, contact summaries for populating order
//! responses). Both lookups are traits so the service stays agnostic of
//! where the data actually lives; the in-memory implementations back
//! development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::core::auth::Role;
use crate::core::error::StorageError;

/// A purchasable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
            is_available: true,
            created_at: Utc::now(),
        }
    }
}

/// The contact summary embedded in populated order responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

/// Read-only product lookup
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get(&self, id: &Uuid) -> Result<Option<Product>, StorageError>;
}

/// Read-only user lookup for response population
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get(&self, id: &Uuid) -> Result<Option<UserSummary>, StorageError>;
}

/// In-memory product catalog
#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<Uuid, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a product, returning it for convenience in test setup
    pub fn add(&self, product: Product) -> Product {
        self.products
            .write()
            .expect("product catalog lock poisoned")
            .insert(product.id, product.clone());
        product
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get(&self, id: &Uuid) -> Result<Option<Product>, StorageError> {
        Ok(self
            .products
            .read()
            .expect("product catalog lock poisoned")
            .get(id)
            .cloned())
    }
}

/// In-memory user directory
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, UserSummary>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, user: UserSummary) -> UserSummary {
        self.users
            .write()
            .expect("user directory lock poisoned")
            .insert(user.id, user.clone());
        user
    }

    /// Register a user from parts, generating the id
    pub fn register(&self, name: &str, email: &str, phone: &str, role: Role) -> UserSummary {
        self.add(UserSummary {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            role,
        })
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get(&self, id: &Uuid) -> Result<Option<UserSummary>, StorageError> {
        Ok(self
            .users
            .read()
            .expect("user directory lock poisoned")
            .get(id)
            .cloned())
    }
}
