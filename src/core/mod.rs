//! Cross-cutting concerns: errors, authentication, events

pub mod auth;
pub mod error;
pub mod events;

pub use auth::{AuthContext, AuthProvider, Role};
pub use error::{ZiplyError, ZiplyResult};
pub use events::{EventBus, EventEnvelope, EventScope, OrderEvent};
