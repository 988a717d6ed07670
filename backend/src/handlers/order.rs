//! HTTP handlers for order management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{Order, OrderKind, OrderStatus};

use crate::error::AppResult;
use crate::repository::OrderFilter;
use crate::services::fulfillment::FulfillmentOutcome;
use crate::services::order::CreateOrderInput;
use crate::AppState;

/// Query parameters for listing orders
#[derive(Debug, Deserialize, Default)]
pub struct OrderListQuery {
    pub workstation_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub kind: Option<OrderKind>,
}

/// Create an order
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<Order>> {
    let order = state.orders.create_order(input).await?;
    Ok(Json(order))
}

/// List orders
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state
        .orders
        .list_orders(OrderFilter {
            workstation_id: query.workstation_id,
            status: query.status,
            kind: query.kind,
        })
        .await?;
    Ok(Json(orders))
}

/// Get an order by id
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_order(id).await?;
    Ok(Json(order))
}

/// Get an order by order number
pub async fn get_order_by_number(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_by_number(&order_number).await?;
    Ok(Json(order))
}

/// Get every order in the chain containing the given order number
pub async fn get_order_chain(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.chain(&order_number).await?;
    Ok(Json(orders))
}

/// Confirm an order and classify it against current stock
pub async fn confirm_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.orders.confirm_order(id).await?;
    Ok(Json(order))
}

/// Start work on an order
pub async fn start_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.orders.start_order(id).await?;
    Ok(Json(order))
}

/// Halt an order
pub async fn halt_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.orders.halt_order(id).await?;
    Ok(Json(order))
}

/// Resume a halted order
pub async fn resume_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.orders.resume_order(id).await?;
    Ok(Json(order))
}

/// Abandon a halted order
pub async fn abandon_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.orders.abandon_order(id).await?;
    Ok(Json(order))
}

/// Cancel an order that has not started
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.orders.cancel_order(id).await?;
    Ok(Json(order))
}

/// Escalate an order to downstream order creation
pub async fn escalate_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let order = state.orders.escalate_order(id).await?;
    Ok(Json(order))
}

/// Attempt fulfillment of an order from current stock
pub async fn fulfill_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FulfillmentOutcome>> {
    let outcome = state.fulfillment.fulfill(id).await?;
    Ok(Json(outcome))
}
