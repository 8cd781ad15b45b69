//! Integration tests for the WebSocket exposure
//!
//! These tests spin up a real HTTP+WebSocket server and verify the full
//! event flow: authenticated connect → subscribe → REST mutation →
//! receive scoped event via WS → reconcile against REST.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

use ziply::catalog::{InMemoryProductCatalog, InMemoryUserDirectory, Product};
use ziply::config::CorsConfig;
use ziply::core::auth::{Role, StaticTokenAuthProvider};
use ziply::core::events::EventBus;
use ziply::orders::OrderService;
use ziply::server::{self, AppState};
use ziply::storage::InMemoryOrderStore;

const CUSTOMER_TOKEN: &str = "customer-token";
const VENDOR_TOKEN: &str = "vendor-token";
const VENDOR2_TOKEN: &str = "vendor2-token";
const DELIVERY_TOKEN: &str = "delivery-token";

struct TestEnv {
    addr: SocketAddr,
    client: reqwest::Client,
    vendor_id: Uuid,
    courier_id: Uuid,
    product_id: Uuid,
}

type WsWrite = futures_util::stream::SplitSink<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;
type WsRead = futures_util::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
>;

async fn start_server() -> TestEnv {
    let store = Arc::new(InMemoryOrderStore::new());
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let auth = Arc::new(StaticTokenAuthProvider::new());
    let events = EventBus::new(64);

    let customer = directory.register("Chitra", "chitra@example.com", "555-0101", Role::Customer);
    let vendor = directory.register("Vikram", "vikram@example.com", "555-0102", Role::Vendor);
    let vendor2 = directory.register("Rahul", "rahul@example.com", "555-0105", Role::Vendor);
    let courier = directory.register("Dev", "dev@example.com", "555-0103", Role::Delivery);

    auth.issue(CUSTOMER_TOKEN, customer.id, Role::Customer);
    auth.issue(VENDOR_TOKEN, vendor.id, Role::Vendor);
    auth.issue(VENDOR2_TOKEN, vendor2.id, Role::Vendor);
    auth.issue(DELIVERY_TOKEN, courier.id, Role::Delivery);

    let product = catalog.add(Product::new("Basmati rice 25kg", 50.0));

    let orders = Arc::new(OrderService::new(store, catalog, directory, events.clone()));
    let state = AppState::new(orders, auth, events);
    let app = server::build_router(state, &CorsConfig::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestEnv {
        addr,
        client: reqwest::Client::new(),
        vendor_id: vendor.id,
        courier_id: courier.id,
        product_id: product.id,
    }
}

/// Connect with a token and consume the welcome message
async fn ws_connect(addr: SocketAddr, token: &str) -> (Value, WsWrite, WsRead) {
    let url = format!("ws://{}/ws?token={}", addr, token);
    let (ws_stream, _) = connect_async(&url).await.expect("Failed to connect");
    let (write, mut read) = ws_stream.split();

    let welcome = ws_recv_from(&mut read).await;
    assert_eq!(welcome["type"], "welcome");
    assert!(welcome["connection_id"].is_string());

    (welcome, write, read)
}

async fn ws_send(write: &mut WsWrite, msg: &Value) {
    let text = serde_json::to_string(msg).unwrap();
    write.send(Message::Text(text.into())).await.unwrap();
}

async fn ws_recv_from(read: &mut WsRead) -> Value {
    let msg = timeout(Duration::from_secs(2), read.next())
        .await
        .expect("Timeout waiting for WS message")
        .expect("Stream ended")
        .expect("WS error");
    match msg {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("Expected text message, got {:?}", other),
    }
}

/// Subscribe with an empty filter and consume the confirmation
async fn ws_subscribe(write: &mut WsWrite, read: &mut WsRead) -> String {
    ws_send(write, &json!({"type": "subscribe", "filter": {}})).await;
    let subscribed = ws_recv_from(read).await;
    assert_eq!(subscribed["type"], "subscribed");
    subscribed["subscription_id"].as_str().unwrap().to_string()
}

async fn create_order(env: &TestEnv) -> Value {
    let response = env
        .client
        .post(format!("http://{}/orders", env.addr))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({
            "vendor": env.vendor_id,
            "items": [{"product": env.product_id, "quantity": 2}],
            "delivery_address": {"street": "14 Market Road", "city": "Pune", "state": "MH", "zip_code": "411001"},
            "payment_method": "cash"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    response.json().await.unwrap()
}

// === Tests ===

#[tokio::test]
async fn test_connect_requires_token() {
    let env = start_server().await;
    let url = format!("ws://{}/ws", env.addr);
    let result = connect_async(&url).await;
    assert!(result.is_err(), "anonymous upgrade should be refused");

    let url = format!("ws://{}/ws?token=bogus", env.addr);
    let result = connect_async(&url).await;
    assert!(result.is_err(), "unknown token should be refused");
}

#[tokio::test]
async fn test_connect_and_welcome() {
    let env = start_server().await;
    let (welcome, _write, _read) = ws_connect(env.addr, VENDOR_TOKEN).await;
    let conn_id = welcome["connection_id"].as_str().unwrap();
    assert!(conn_id.starts_with("conn_"));
}

#[tokio::test]
async fn test_ping_pong() {
    let env = start_server().await;
    let (_welcome, mut write, mut read) = ws_connect(env.addr, VENDOR_TOKEN).await;

    ws_send(&mut write, &json!({"type": "ping"})).await;
    let pong = ws_recv_from(&mut read).await;
    assert_eq!(pong["type"], "pong");
}

#[tokio::test]
async fn test_vendor_receives_created_event() {
    let env = start_server().await;
    let (_welcome, mut write, mut read) = ws_connect(env.addr, VENDOR_TOKEN).await;
    let sub_id = ws_subscribe(&mut write, &mut read).await;

    let order = create_order(&env).await;

    let event = ws_recv_from(&mut read).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["subscription_id"], sub_id.as_str());
    assert_eq!(event["data"]["event"]["event"], "created");
    assert_eq!(event["data"]["event"]["order_id"], order["id"]);
    // The created event carries the full populated order
    assert_eq!(event["data"]["event"]["order"]["total_amount"], 100.0);
}

#[tokio::test]
async fn test_customer_receives_status_change_and_rest_agrees() {
    let env = start_server().await;
    let order = create_order(&env).await;
    let order_id = order["id"].as_str().unwrap();

    let (_welcome, mut write, mut read) = ws_connect(env.addr, CUSTOMER_TOKEN).await;
    ws_subscribe(&mut write, &mut read).await;

    let response = env
        .client
        .patch(format!("http://{}/orders/{}/status", env.addr, order_id))
        .bearer_auth(VENDOR_TOKEN)
        .json(&json!({"status": "confirmed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let event = ws_recv_from(&mut read).await;
    assert_eq!(event["data"]["event"]["event"], "status_changed");
    assert_eq!(event["data"]["event"]["status"], "confirmed");
    assert!(event["data"]["timestamp"].is_string());

    // The notifier is not the source of truth: REST must agree
    let response = env
        .client
        .get(format!("http://{}/orders/{}", env.addr, order_id))
        .bearer_auth(CUSTOMER_TOKEN)
        .send()
        .await
        .unwrap();
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched["status"], event["data"]["event"]["status"]);
}

#[tokio::test]
async fn test_other_vendor_never_sees_the_event() {
    let env = start_server().await;
    let (_w1, mut write1, mut read1) = ws_connect(env.addr, VENDOR_TOKEN).await;
    let (_w2, mut write2, mut read2) = ws_connect(env.addr, VENDOR2_TOKEN).await;
    ws_subscribe(&mut write1, &mut read1).await;
    ws_subscribe(&mut write2, &mut read2).await;

    create_order(&env).await;

    // The owning vendor gets the event
    let event = ws_recv_from(&mut read1).await;
    assert_eq!(event["data"]["event"]["event"], "created");

    // The other vendor gets nothing
    let silence = timeout(Duration::from_millis(300), read2.next()).await;
    assert!(silence.is_err(), "vendor2 should not receive another vendor's event");
}

#[tokio::test]
async fn test_delivery_person_sees_events_after_assignment() {
    let env = start_server().await;
    let order = create_order(&env).await;
    let order_id = order["id"].as_str().unwrap();

    let (_welcome, mut write, mut read) = ws_connect(env.addr, DELIVERY_TOKEN).await;
    ws_subscribe(&mut write, &mut read).await;

    // Before assignment the courier is outside the order's scope; the
    // assignment event itself is the first one they receive
    let response = env
        .client
        .patch(format!(
            "http://{}/orders/{}/assign-delivery",
            env.addr, order_id
        ))
        .bearer_auth(VENDOR_TOKEN)
        .json(&json!({"delivery_person_id": env.courier_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let event = ws_recv_from(&mut read).await;
    assert_eq!(event["data"]["event"]["event"], "delivery_assigned");
    assert_eq!(
        event["data"]["event"]["delivery_person_id"],
        json!(env.courier_id)
    );
}

#[tokio::test]
async fn test_subscription_filter_narrows_by_event_kind() {
    let env = start_server().await;
    let (_welcome, mut write, mut read) = ws_connect(env.addr, VENDOR_TOKEN).await;

    ws_send(
        &mut write,
        &json!({"type": "subscribe", "filter": {"event": "status_changed"}}),
    )
    .await;
    let subscribed = ws_recv_from(&mut read).await;
    assert_eq!(subscribed["type"], "subscribed");

    let order = create_order(&env).await;
    let order_id = order["id"].as_str().unwrap();

    // The created event is filtered out; the status change arrives
    let response = env
        .client
        .patch(format!("http://{}/orders/{}/status", env.addr, order_id))
        .bearer_auth(VENDOR_TOKEN)
        .json(&json!({"status": "confirmed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let event = ws_recv_from(&mut read).await;
    assert_eq!(event["data"]["event"]["event"], "status_changed");
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let env = start_server().await;
    let (_welcome, mut write, mut read) = ws_connect(env.addr, VENDOR_TOKEN).await;
    let sub_id = ws_subscribe(&mut write, &mut read).await;

    ws_send(
        &mut write,
        &json!({"type": "unsubscribe", "subscription_id": sub_id}),
    )
    .await;
    let unsubscribed = ws_recv_from(&mut read).await;
    assert_eq!(unsubscribed["type"], "unsubscribed");

    create_order(&env).await;
    let silence = timeout(Duration::from_millis(300), read.next()).await;
    assert!(silence.is_err(), "no events after unsubscribing");
}

#[tokio::test]
async fn test_malformed_and_unknown_messages_get_error() {
    let env = start_server().await;
    let (_welcome, mut write, mut read) = ws_connect(env.addr, VENDOR_TOKEN).await;

    write
        .send(Message::Text("not json at all".to_string().into()))
        .await
        .unwrap();
    let error = ws_recv_from(&mut read).await;
    assert_eq!(error["type"], "error");

    // The legacy client-originated relay is not a recognized message
    ws_send(
        &mut write,
        &json!({"type": "order_status_update", "data": {"status": "delivered"}}),
    )
    .await;
    let error = ws_recv_from(&mut read).await;
    assert_eq!(error["type"], "error");
}
