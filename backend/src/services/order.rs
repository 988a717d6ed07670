//! Order management service
//!
//! Owns order creation, chain numbering, and every guarded lifecycle
//! transition except fulfillment itself (see `services::fulfillment`).

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use shared::{
    base_token, derive_order_number, evaluate, new_root_order_number, validate_order_items,
    validate_parent_for_kind, validate_priority, validate_workstation_id, Order, OrderItem,
    OrderKind, OrderStatus, TokenSource,
};

use crate::error::{AppError, AppResult};
use crate::external::{DownstreamOrderClient, DownstreamOrderRequest};
use crate::repository::{OrderFilter, OrderRepository, StockRepository};

/// Input for creating an order
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub kind: OrderKind,
    pub parent_order_number: Option<String>,
    #[validate(range(min = 1))]
    pub workstation_id: i64,
    pub items: Vec<OrderItem>,
    pub priority: Option<i32>,
}

/// Order service for creation, queries, and lifecycle transitions
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    stock: Arc<dyn StockRepository>,
    tokens: Arc<dyn TokenSource>,
    downstream: Arc<dyn DownstreamOrderClient>,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        stock: Arc<dyn StockRepository>,
        tokens: Arc<dyn TokenSource>,
        downstream: Arc<dyn DownstreamOrderClient>,
    ) -> Self {
        Self {
            orders,
            stock,
            tokens,
            downstream,
        }
    }

    /// Create an order in Pending status
    ///
    /// Customer orders root a new chain; every other kind derives its number
    /// from the parent so the whole chain shares one base token.
    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<Order> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        validate_workstation_id(input.workstation_id).map_err(|msg| AppError::Validation {
            field: "workstation_id".to_string(),
            message: msg.to_string(),
        })?;
        validate_order_items(&input.items).map_err(|msg| AppError::Validation {
            field: "items".to_string(),
            message: msg.to_string(),
        })?;
        let priority = input.priority.unwrap_or(0);
        validate_priority(priority).map_err(|msg| AppError::Validation {
            field: "priority".to_string(),
            message: msg.to_string(),
        })?;
        validate_parent_for_kind(input.kind, input.parent_order_number.as_deref()).map_err(
            |msg| AppError::Validation {
                field: "parent_order_number".to_string(),
                message: msg.to_string(),
            },
        )?;

        let order_number = match &input.parent_order_number {
            Some(parent) => derive_order_number(parent, input.kind.prefix())?,
            None => new_root_order_number(self.tokens.as_ref()),
        };

        let order = Order {
            id: Uuid::new_v4(),
            order_number,
            parent_order_number: input.parent_order_number,
            kind: input.kind,
            workstation_id: input.workstation_id,
            items: input.items,
            status: OrderStatus::Pending,
            trigger_scenario: None,
            priority,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };

        let order = self.orders.insert(order).await?;
        tracing::info!(
            order_number = %order.order_number,
            kind = %order.kind,
            workstation_id = order.workstation_id,
            "Order created"
        );
        Ok(order)
    }

    /// Confirm a pending order, computing its initial trigger scenario from
    /// a fresh stock snapshot
    pub async fn confirm_order(&self, id: Uuid) -> AppResult<Order> {
        let mut order = self.orders.get(id).await?;
        if !order.status.can_confirm() {
            return Err(AppError::InvalidOrderState {
                current: order.status,
                attempted: OrderStatus::Confirmed,
            });
        }

        let snapshot = self.stock.snapshot(order.workstation_id).await?;
        let scenario = evaluate(&order.items, order.workstation_id, &snapshot);

        order.status = OrderStatus::Confirmed;
        order.trigger_scenario = Some(scenario);
        self.orders.update(&order).await?;

        tracing::info!(
            order_number = %order.order_number,
            scenario = %scenario,
            "Order confirmed"
        );
        Ok(order)
    }

    /// Start work on an order
    pub async fn start_order(&self, id: Uuid) -> AppResult<Order> {
        let mut order = self.orders.get(id).await?;
        if !order.status.can_start() {
            return Err(AppError::InvalidOrderState {
                current: order.status,
                attempted: OrderStatus::InProgress,
            });
        }
        order.status = OrderStatus::InProgress;
        order.started_at = Some(Utc::now());
        self.orders.update(&order).await?;
        Ok(order)
    }

    /// Operator-initiated pause; reversible via resume
    pub async fn halt_order(&self, id: Uuid) -> AppResult<Order> {
        let mut order = self.orders.get(id).await?;
        if !order.status.can_halt() {
            return Err(AppError::InvalidOrderState {
                current: order.status,
                attempted: OrderStatus::Halted,
            });
        }
        order.status = OrderStatus::Halted;
        self.orders.update(&order).await?;
        Ok(order)
    }

    /// Resume a halted order back to Confirmed
    pub async fn resume_order(&self, id: Uuid) -> AppResult<Order> {
        let mut order = self.orders.get(id).await?;
        if !order.status.can_resume() {
            return Err(AppError::InvalidOrderState {
                current: order.status,
                attempted: OrderStatus::Confirmed,
            });
        }
        order.status = OrderStatus::Confirmed;
        self.orders.update(&order).await?;
        Ok(order)
    }

    /// Abandon a halted order (terminal)
    pub async fn abandon_order(&self, id: Uuid) -> AppResult<Order> {
        let mut order = self.orders.get(id).await?;
        if !order.status.can_abandon() {
            return Err(AppError::InvalidOrderState {
                current: order.status,
                attempted: OrderStatus::Abandoned,
            });
        }
        order.status = OrderStatus::Abandoned;
        self.orders.update(&order).await?;
        Ok(order)
    }

    /// Cancel an order that has not started (terminal)
    pub async fn cancel_order(&self, id: Uuid) -> AppResult<Order> {
        let mut order = self.orders.get(id).await?;
        if !order.status.can_cancel() {
            return Err(AppError::InvalidOrderState {
                current: order.status,
                attempted: OrderStatus::Cancelled,
            });
        }
        order.status = OrderStatus::Cancelled;
        self.orders.update(&order).await?;
        Ok(order)
    }

    /// Escalate a confirmed order to downstream order creation
    ///
    /// The status transition commits before the collaborator is invoked, so
    /// a downstream failure can never leave order state inconsistent; the
    /// caller retries the enqueue on error.
    pub async fn escalate_order(&self, id: Uuid) -> AppResult<Order> {
        let mut order = self.orders.get(id).await?;
        if !order.status.can_escalate() {
            return Err(AppError::InvalidOrderState {
                current: order.status,
                attempted: OrderStatus::Escalated,
            });
        }

        let snapshot = self.stock.snapshot(order.workstation_id).await?;
        let scenario = evaluate(&order.items, order.workstation_id, &snapshot);
        let missing_items: Vec<OrderItem> = order
            .items
            .iter()
            .filter(|item| {
                snapshot
                    .get(&item.stock_key(order.workstation_id))
                    .copied()
                    .unwrap_or(0)
                    < item.quantity
            })
            .cloned()
            .collect();

        order.status = OrderStatus::Escalated;
        order.trigger_scenario = Some(scenario);
        self.orders.update(&order).await?;

        let reference = self
            .downstream
            .create_downstream(DownstreamOrderRequest {
                scenario,
                source_order_number: order.order_number.clone(),
                workstation_id: order.workstation_id,
                missing_items,
            })
            .await?;

        tracing::info!(
            order_number = %order.order_number,
            downstream = ?reference.order_number,
            "Order escalated"
        );
        Ok(order)
    }

    /// Get an order by id
    pub async fn get_order(&self, id: Uuid) -> AppResult<Order> {
        self.orders.get(id).await
    }

    /// Get an order by its correlation number
    pub async fn get_by_number(&self, order_number: &str) -> AppResult<Order> {
        self.orders.get_by_number(order_number).await
    }

    /// List orders matching the filter
    pub async fn list_orders(&self, filter: OrderFilter) -> AppResult<Vec<Order>> {
        self.orders.list(filter).await
    }

    /// Every order in the chain containing the given order number
    pub async fn chain(&self, order_number: &str) -> AppResult<Vec<Order>> {
        let base = base_token(order_number)?;
        self.orders.chain(base).await
    }
}
