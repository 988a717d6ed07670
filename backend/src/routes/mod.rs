//! Route definitions for the Factory Order Management Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/orders", order_routes())
        .nest("/stock", stock_routes())
}

/// Order management routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route("/:id", get(handlers::get_order))
        .route("/number/:order_number", get(handlers::get_order_by_number))
        .route(
            "/number/:order_number/chain",
            get(handlers::get_order_chain),
        )
        .route("/:id/confirm", post(handlers::confirm_order))
        .route("/:id/start", post(handlers::start_order))
        .route("/:id/halt", post(handlers::halt_order))
        .route("/:id/resume", post(handlers::resume_order))
        .route("/:id/abandon", post(handlers::abandon_order))
        .route("/:id/cancel", post(handlers::cancel_order))
        .route("/:id/escalate", post(handlers::escalate_order))
        .route("/:id/fulfill", post(handlers::fulfill_order))
}

/// Stock ledger routes
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/adjustments", post(handlers::adjust_stock))
        .route("/levels/:workstation_id", get(handlers::get_stock_levels))
        .route("/ledger", get(handlers::get_ledger))
        .route("/ledger/recent", get(handlers::get_recent_ledger))
}
