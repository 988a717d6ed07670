//! Factory Order Management Platform - Backend
//!
//! Order fulfillment orchestration over an append-only stock ledger:
//! trigger-scenario classification, atomic fulfillment debits, and cascade
//! re-evaluation of sibling orders.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod repository;
pub mod routes;
pub mod services;

pub use config::Config;

use services::{FulfillmentService, OrderService, StockService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub stock: StockService,
    pub fulfillment: FulfillmentService,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Factory Order Management Platform API v1.0"
}
