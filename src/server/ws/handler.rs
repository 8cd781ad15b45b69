//! WebSocket upgrade handler and message loop
//!
//! Handles the HTTP → WebSocket upgrade and runs the per-connection
//! message loop. The upgrade is authenticated: the bearer token comes
//! from the `Authorization` header or, for browser clients that cannot
//! set headers on the upgrade request, the `token` query parameter.
//! Anonymous upgrades are refused before the handshake completes.
//!
//! Each accepted connection gets:
//!
//! 1. A welcome message with its unique connection ID
//! 2. A read loop processing client messages (subscribe, unsubscribe, ping)
//! 3. A write loop forwarding server messages to the WebSocket

use super::WsState;
use super::manager::ConnectionManager;
use super::protocol::{ClientMessage, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures::SinkExt;
use futures::stream::StreamExt;
use serde::Deserialize;
use std::sync::Arc;

use crate::core::auth::{AuthContext, bearer_token};
use crate::core::error::{AuthError, ZiplyError};

/// Query parameters accepted on the upgrade request
#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// WebSocket upgrade handler for GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
) -> Response {
    let token = match bearer_token(&headers) {
        Ok(token) => token.to_string(),
        Err(_) => match query.token {
            Some(token) => token,
            None => return ZiplyError::from(AuthError::MissingToken).into_response(),
        },
    };

    let identity = match state.auth.authenticate(&token).await {
        Ok(identity) => identity,
        Err(err) => return ZiplyError::from(err).into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state.manager, identity))
}

/// Handle a single authenticated WebSocket connection
async fn handle_socket(socket: WebSocket, manager: Arc<ConnectionManager>, identity: AuthContext) {
    let (conn_id, mut server_rx) = manager.connect(identity).await;

    let (mut ws_write, mut ws_read) = socket.split();

    // Send welcome message
    let welcome = ServerMessage::Welcome {
        connection_id: conn_id.clone(),
    };
    if let Ok(json) = serde_json::to_string(&welcome)
        && ws_write.send(Message::Text(json.into())).await.is_err()
    {
        manager.disconnect(&conn_id).await;
        return;
    }

    let conn_id_write = conn_id.clone();
    let conn_id_read = conn_id.clone();
    let manager_read = manager.clone();

    // Write loop: forward ServerMessages from the manager to the socket
    let write_handle = tokio::spawn(async move {
        while let Some(msg) = server_rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_write.send(Message::Text(json.into())).await.is_err() {
                        tracing::debug!(
                            connection_id = %conn_id_write,
                            "WebSocket write failed, closing"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        connection_id = %conn_id_write,
                        error = %e,
                        "Failed to serialize ServerMessage"
                    );
                }
            }
        }
    });

    // Read loop: process client messages
    while let Some(result) = ws_read.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_client_message(&manager_read, &conn_id_read, &text).await;
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %conn_id_read, "Client sent close frame");
                break;
            }
            Ok(Message::Ping(_)) => {
                // axum handles pong automatically
            }
            Ok(_) => {
                // Ignore binary and other message types
            }
            Err(e) => {
                tracing::debug!(
                    connection_id = %conn_id_read,
                    error = %e,
                    "WebSocket read error"
                );
                break;
            }
        }
    }

    // Cleanup
    write_handle.abort();
    manager.disconnect(&conn_id).await;
}

/// Process a single client message
async fn handle_client_message(manager: &ConnectionManager, connection_id: &str, text: &str) {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            let error_msg = ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            };
            manager.send_to(connection_id, error_msg).await;
            return;
        }
    };

    match msg {
        ClientMessage::Subscribe { filter } => {
            match manager.subscribe(connection_id, filter.clone()).await {
                Ok(sub_id) => {
                    let response = ServerMessage::Subscribed {
                        subscription_id: sub_id,
                        filter,
                    };
                    manager.send_to(connection_id, response).await;
                }
                Err(e) => {
                    manager
                        .send_to(connection_id, ServerMessage::Error { message: e })
                        .await;
                }
            }
        }
        ClientMessage::Unsubscribe { subscription_id } => {
            match manager.unsubscribe(connection_id, &subscription_id).await {
                Ok(true) => {
                    let response = ServerMessage::Unsubscribed { subscription_id };
                    manager.send_to(connection_id, response).await;
                }
                Ok(false) => {
                    let error_msg = ServerMessage::Error {
                        message: format!("Subscription {} not found", subscription_id),
                    };
                    manager.send_to(connection_id, error_msg).await;
                }
                Err(e) => {
                    manager
                        .send_to(connection_id, ServerMessage::Error { message: e })
                        .await;
                }
            }
        }
        ClientMessage::Ping => {
            manager.send_to(connection_id, ServerMessage::Pong).await;
        }
    }
}
