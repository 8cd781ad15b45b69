//! Ziply service entrypoint
//!
//! Wires the in-memory backends together, seeds a small demo dataset
//! (the platform's real user/product services live elsewhere), and
//! serves the REST + WebSocket API.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ziply::catalog::{InMemoryProductCatalog, InMemoryUserDirectory, Product};
use ziply::config::AppConfig;
use ziply::core::auth::{Role, StaticTokenAuthProvider};
use ziply::core::events::EventBus;
use ziply::orders::OrderService;
use ziply::server::{self, AppState};
use ziply::storage::InMemoryOrderStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load()?;

    let store = Arc::new(InMemoryOrderStore::new());
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let auth = Arc::new(StaticTokenAuthProvider::new());
    let events = EventBus::new(config.events.channel_capacity);

    seed_demo_data(&catalog, &directory, &auth);

    let orders = Arc::new(OrderService::new(
        store,
        catalog,
        directory,
        events.clone(),
    ));
    let state = AppState::new(orders, auth, events);
    let app = server::build_router(state, &config.cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "ziply listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed demo users, tokens, and products so the service is usable out
/// of the box. Real deployments plug in the platform's user and product
/// services instead.
fn seed_demo_data(
    catalog: &InMemoryProductCatalog,
    directory: &InMemoryUserDirectory,
    auth: &StaticTokenAuthProvider,
) {
    let customer = directory.register(
        "Demo Customer",
        "customer@ziply.test",
        "555-0101",
        Role::Customer,
    );
    let vendor = directory.register("Demo Vendor", "vendor@ziply.test", "555-0102", Role::Vendor);
    let courier = directory.register(
        "Demo Courier",
        "courier@ziply.test",
        "555-0103",
        Role::Delivery,
    );

    auth.issue("customer-token", customer.id, Role::Customer);
    auth.issue("vendor-token", vendor.id, Role::Vendor);
    auth.issue("delivery-token", courier.id, Role::Delivery);

    let rice = catalog.add(Product::new("Basmati rice 25kg", 50.0));
    let ghee = catalog.add(Product::new("Ghee 1L", 100.0));

    info!(
        customer = %customer.id,
        vendor = %vendor.id,
        courier = %courier.id,
        "seeded demo users (tokens: customer-token, vendor-token, delivery-token)"
    );
    info!(rice = %rice.id, ghee = %ghee.id, "seeded demo products");
}
