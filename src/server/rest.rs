//! REST API exposure
//!
//! Thin axum handlers over the order service: each one authenticates
//! the bearer token, delegates to the service, and lets `ZiplyError`'s
//! `IntoResponse` shape failures into `{code, message}` bodies.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, patch};
use axum::Router;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::AppState;
use crate::core::auth::authenticate_headers;
use crate::core::error::{ValidationError, ZiplyResult};
use crate::orders::model::OrderStatus;
use crate::orders::service::{CreateOrderRequest, OrderView};

/// Payload of `PATCH /orders/{id}/status`
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Payload of `PATCH /orders/{id}/assign-delivery`
#[derive(Debug, Deserialize)]
pub struct AssignDeliveryRequest {
    pub delivery_person_id: Uuid,
}

/// Build the REST router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/customer", get(list_customer_orders))
        .route("/orders/live", get(list_live_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", patch(update_status))
        .route("/orders/{id}/assign-delivery", patch(assign_delivery))
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "ziply"
    }))
}

/// GET /orders — vendor's own orders, or a delivery person's assignments
async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ZiplyResult<Json<Vec<OrderView>>> {
    let actor = authenticate_headers(state.auth.as_ref(), &headers).await?;
    Ok(Json(state.orders.list_orders(&actor).await?))
}

/// GET /orders/customer — the calling customer's orders
async fn list_customer_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ZiplyResult<Json<Vec<OrderView>>> {
    let actor = authenticate_headers(state.auth.as_ref(), &headers).await?;
    Ok(Json(state.orders.list_customer_orders(&actor).await?))
}

/// GET /orders/live — role-scoped orders in non-terminal statuses
async fn list_live_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ZiplyResult<Json<Vec<OrderView>>> {
    let actor = authenticate_headers(state.auth.as_ref(), &headers).await?;
    Ok(Json(state.orders.list_live_orders(&actor).await?))
}

/// GET /orders/{id}
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> ZiplyResult<Json<OrderView>> {
    let actor = authenticate_headers(state.auth.as_ref(), &headers).await?;
    Ok(Json(state.orders.get_order(&actor, id).await?))
}

/// POST /orders — place an order (customers only)
async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateOrderRequest>,
) -> ZiplyResult<(StatusCode, Json<OrderView>)> {
    let actor = authenticate_headers(state.auth.as_ref(), &headers).await?;
    let view = state.orders.create_order(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PATCH /orders/{id}/status
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<UpdateStatusRequest>,
) -> ZiplyResult<Json<OrderView>> {
    let actor = authenticate_headers(state.auth.as_ref(), &headers).await?;
    let status: OrderStatus = request
        .status
        .parse()
        .map_err(|value| ValidationError::InvalidStatus { value })?;
    Ok(Json(state.orders.update_status(&actor, id, status).await?))
}

/// PATCH /orders/{id}/assign-delivery
async fn assign_delivery(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<AssignDeliveryRequest>,
) -> ZiplyResult<Json<OrderView>> {
    let actor = authenticate_headers(state.auth.as_ref(), &headers).await?;
    Ok(Json(
        state
            .orders
            .assign_delivery(&actor, id, request.delivery_person_id)
            .await?,
    ))
}
