//! Typed error handling for the ziply service
//!
//! Every failure a route handler can surface is a [`ZiplyError`] variant
//! with a matching HTTP status code and a machine-readable error code.
//! The route boundary converts errors into a JSON `{code, message}` body
//! via `IntoResponse`; nothing is retried.
//!
//! # Error Categories
//!
//! - [`OrderError`]: order lifecycle failures (unknown order, unavailable
//!   product, invalid status transition)
//! - [`AuthError`]: authentication and authorization failures
//! - [`ValidationError`]: malformed request payloads
//! - [`StorageError`]: order store failures
//! - [`ConfigError`]: configuration loading failures

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::orders::model::OrderStatus;

/// The main error type for the ziply service
#[derive(Debug)]
pub enum ZiplyError {
    /// Order lifecycle errors
    Order(OrderError),

    /// Authentication/authorization errors
    Auth(AuthError),

    /// Request validation errors
    Validation(ValidationError),

    /// Storage backend errors
    Storage(StorageError),

    /// Configuration errors
    Config(ConfigError),

    /// Internal errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ZiplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZiplyError::Order(e) => write!(f, "{}", e),
            ZiplyError::Auth(e) => write!(f, "{}", e),
            ZiplyError::Validation(e) => write!(f, "{}", e),
            ZiplyError::Storage(e) => write!(f, "{}", e),
            ZiplyError::Config(e) => write!(f, "{}", e),
            ZiplyError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ZiplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ZiplyError::Order(e) => Some(e),
            ZiplyError::Auth(e) => Some(e),
            ZiplyError::Validation(e) => Some(e),
            ZiplyError::Storage(e) => Some(e),
            ZiplyError::Config(e) => Some(e),
            ZiplyError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ZiplyError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ZiplyError::Order(e) => e.status_code(),
            ZiplyError::Auth(e) => e.status_code(),
            ZiplyError::Validation(_) => StatusCode::BAD_REQUEST,
            ZiplyError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ZiplyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ZiplyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ZiplyError::Order(e) => e.error_code(),
            ZiplyError::Auth(e) => e.error_code(),
            ZiplyError::Validation(_) => "VALIDATION_ERROR",
            ZiplyError::Storage(_) => "STORAGE_ERROR",
            ZiplyError::Config(_) => "CONFIG_ERROR",
            ZiplyError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response body
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for ZiplyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }
        (status, Json(self.to_response())).into_response()
    }
}

// =============================================================================
// Order Errors
// =============================================================================

/// Errors raised by order lifecycle operations
#[derive(Debug)]
pub enum OrderError {
    /// Order was not found
    NotFound { id: Uuid },

    /// Referenced product is missing or not purchasable
    ProductUnavailable { product_id: Uuid },

    /// Requested status transition is not allowed from the current status
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::NotFound { id } => {
                write!(f, "Order '{}' not found", id)
            }
            OrderError::ProductUnavailable { product_id } => {
                write!(f, "Product {} is not available", product_id)
            }
            OrderError::InvalidTransition { from, to } => {
                write!(f, "Cannot change order status from '{}' to '{}'", from, to)
            }
        }
    }
}

impl std::error::Error for OrderError {}

impl OrderError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OrderError::NotFound { .. } => StatusCode::NOT_FOUND,
            OrderError::ProductUnavailable { .. } => StatusCode::BAD_REQUEST,
            OrderError::InvalidTransition { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OrderError::NotFound { .. } => "ORDER_NOT_FOUND",
            OrderError::ProductUnavailable { .. } => "PRODUCT_UNAVAILABLE",
            OrderError::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}

impl From<OrderError> for ZiplyError {
    fn from(err: OrderError) -> Self {
        ZiplyError::Order(err)
    }
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Authentication and authorization errors
#[derive(Debug)]
pub enum AuthError {
    /// No bearer token on the request
    MissingToken,

    /// Token did not resolve to a known user
    InvalidToken,

    /// Authenticated but the role/ownership check failed
    Forbidden { message: String },
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::InvalidToken => write!(f, "Invalid authentication token"),
            AuthError::Forbidden { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// Forbidden error with the message the original dashboards expect
    pub fn not_authorized(action: &str) -> Self {
        AuthError::Forbidden {
            message: format!("Not authorized to {}", action),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => "UNAUTHENTICATED",
            AuthError::Forbidden { .. } => "FORBIDDEN",
        }
    }
}

impl From<AuthError> for ZiplyError {
    fn from(err: AuthError) -> Self {
        ZiplyError::Auth(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to request payload validation
#[derive(Debug)]
pub enum ValidationError {
    /// Single field validation error
    FieldError { field: String, message: String },

    /// Status string is not a member of the order status enum
    InvalidStatus { value: String },

    /// Invalid JSON body
    InvalidJson { message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldError { field, message } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
            ValidationError::InvalidStatus { value } => {
                write!(f, "Unknown order status: '{}'", value)
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ZiplyError {
    fn from(err: ValidationError) -> Self {
        ZiplyError::Validation(err)
    }
}

/// Flatten `validator` derive output into the first field error
impl From<validator::ValidationErrors> for ZiplyError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let message = errs
            .field_errors()
            .iter()
            .next()
            .map(|(field, errors)| {
                let detail = errors
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                ValidationError::FieldError {
                    field: field.to_string(),
                    message: detail,
                }
            })
            .unwrap_or(ValidationError::FieldError {
                field: "request".to_string(),
                message: "invalid payload".to_string(),
            });
        ZiplyError::Validation(message)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors raised by the order store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage backend '{backend}' is unavailable")]
    Unavailable { backend: String },

    #[error("Storage {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },
}

impl From<StorageError> for ZiplyError {
    fn from(err: StorageError) -> Self {
        ZiplyError::Storage(err)
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config file '{file}': {message}")]
    ParseError { file: String, message: String },

    #[error("IO error reading config: {0}")]
    Io(String),

    #[error("Invalid value '{value}' for '{field}'")]
    InvalidValue { field: String, value: String },
}

impl From<ConfigError> for ZiplyError {
    fn from(err: ConfigError) -> Self {
        ZiplyError::Config(err)
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for ziply operations
pub type ZiplyResult<T> = Result<T, ZiplyError>;
