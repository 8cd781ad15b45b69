//! Authentication boundary for the ziply service
//!
//! Credential issuance lives outside this crate; the service only needs
//! to resolve a bearer token into an [`AuthContext`] (who is calling and
//! with which role). The [`AuthProvider`] trait is the seam; the
//! [`StaticTokenAuthProvider`] implementation backs development and
//! tests with a fixed token table.

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use uuid::Uuid;

use crate::core::error::AuthError;

/// Role attached to an authenticated actor, gating which operations are
/// permitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Vendor,
    Delivery,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Customer => "customer",
            Role::Vendor => "vendor",
            Role::Delivery => "delivery",
        };
        f.write_str(name)
    }
}

/// Authenticated caller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }

    pub fn is_vendor(&self) -> bool {
        self.role == Role::Vendor
    }

    pub fn is_delivery(&self) -> bool {
        self.role == Role::Delivery
    }
}

/// Trait for auth providers: resolve a bearer token to a caller identity
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve a token, failing with `InvalidToken` when unknown
    async fn authenticate(&self, token: &str) -> Result<AuthContext, AuthError>;
}

/// Pull the bearer token out of an `Authorization` header
///
/// WebSocket clients (browsers cannot set headers on the upgrade
/// request) may instead pass the token via the `token` query parameter;
/// see the ws handler.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidToken)
}

/// Authenticate a request from its headers against a provider
pub async fn authenticate_headers(
    provider: &dyn AuthProvider,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    provider.authenticate(token).await
}

/// Static token table provider for development and tests
///
/// Thread-safe via `RwLock`; tokens can be issued at runtime (test
/// setup) and are resolved on every request.
#[derive(Default)]
pub struct StaticTokenAuthProvider {
    tokens: RwLock<HashMap<String, AuthContext>>,
}

impl StaticTokenAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a user
    pub fn issue(&self, token: impl Into<String>, user_id: Uuid, role: Role) {
        self.tokens
            .write()
            .expect("token table lock poisoned")
            .insert(token.into(), AuthContext::new(user_id, role));
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuthProvider {
    async fn authenticate(&self, token: &str) -> Result<AuthContext, AuthError> {
        self.tokens
            .read()
            .expect("token table lock poisoned")
            .get(token)
            .copied()
            .ok_or(AuthError::InvalidToken)
    }
}
