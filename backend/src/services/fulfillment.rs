//! Fulfillment orchestration
//!
//! The only writer of fulfillment debits. A per-workstation async lock
//! serializes the evaluate-debit-cascade sequence so two orders can never
//! both pass the availability check against the same stock. The cached
//! scenario on the order is advisory; fulfillment always re-checks against
//! current stock under the lock.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use shared::{
    evaluate, LedgerEntry, Order, OrderKind, OrderStatus, ReasonCode, StockAdjustment,
    TriggerScenario,
};

use crate::error::{AppError, AppResult};
use crate::repository::{OrderRepository, StockRepository};

/// Result of a fulfillment attempt
///
/// A stock shortfall is a classified outcome, not an error; callers only see
/// `Err` for structural problems (unknown order, bad state, storage failure).
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FulfillmentOutcome {
    Completed {
        order: Order,
        ledger_entries: Vec<LedgerEntry>,
        /// Sibling orders whose cached scenario changed in the cascade pass
        cascade_updates: usize,
    },
    Unfulfillable {
        order: Order,
        scenario: TriggerScenario,
    },
}

/// Orchestrates order fulfillment against the stock ledger
#[derive(Clone)]
pub struct FulfillmentService {
    orders: Arc<dyn OrderRepository>,
    stock: Arc<dyn StockRepository>,
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl FulfillmentService {
    /// Create a new FulfillmentService instance
    pub fn new(orders: Arc<dyn OrderRepository>, stock: Arc<dyn StockRepository>) -> Self {
        Self {
            orders,
            stock,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn workstation_lock(&self, workstation_id: i64) -> Arc<Mutex<()>> {
        self.locks
            .entry(workstation_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Attempt to fulfill an order from current stock
    ///
    /// Under the workstation lock: reload, re-classify against a fresh
    /// snapshot, and on direct fulfillment debit every line atomically, then
    /// re-evaluate the cached scenario of sibling orders against the reduced
    /// stock. Anything short of direct fulfillment leaves stock untouched.
    pub async fn fulfill(&self, id: Uuid) -> AppResult<FulfillmentOutcome> {
        let order = self.orders.get(id).await?;
        if !order.status.can_complete() {
            return Err(AppError::InvalidOrderState {
                current: order.status,
                attempted: OrderStatus::Completed,
            });
        }

        let lock = self.workstation_lock(order.workstation_id);
        let outcome = {
            let _guard = lock.lock().await;
            self.fulfill_locked(id).await?
        };

        // A completed supply order releases its waiting parent. The parent
        // lives at a different workstation; its lock is taken only after the
        // supply order's lock is released.
        if let FulfillmentOutcome::Completed { order, .. } = &outcome {
            if order.kind == OrderKind::Supply {
                if let Some(parent_number) = &order.parent_order_number {
                    self.release_waiting_parent(parent_number).await?;
                }
            }
        }

        Ok(outcome)
    }

    async fn fulfill_locked(&self, id: Uuid) -> AppResult<FulfillmentOutcome> {
        let mut order = self.orders.get(id).await?;
        if !order.status.can_complete() {
            return Err(AppError::InvalidOrderState {
                current: order.status,
                attempted: OrderStatus::Completed,
            });
        }

        let snapshot = self.stock.snapshot(order.workstation_id).await?;
        let scenario = evaluate(&order.items, order.workstation_id, &snapshot);

        if scenario == TriggerScenario::DirectFulfillment {
            let adjustments: Vec<StockAdjustment> = order
                .items
                .iter()
                .map(|item| StockAdjustment {
                    key: item.stock_key(order.workstation_id),
                    delta: -item.quantity,
                    reason_code: ReasonCode::Fulfillment,
                    notes: Some(order.order_number.clone()),
                })
                .collect();

            match self.stock.adjust_many(adjustments).await {
                Ok(ledger_entries) => {
                    order.status = OrderStatus::Completed;
                    order.trigger_scenario = Some(scenario);
                    order.completed_at = Some(Utc::now());
                    self.orders.update(&order).await?;

                    let cascade_updates = self.cascade(&order).await?;

                    tracing::info!(
                        order_number = %order.order_number,
                        entries = ledger_entries.len(),
                        cascade_updates,
                        "Order fulfilled"
                    );
                    return Ok(FulfillmentOutcome::Completed {
                        order,
                        ledger_entries,
                        cascade_updates,
                    });
                }
                // Another writer (a second instance sharing the database)
                // won the stock between snapshot and debit. Reclassify
                // against current stock and fall through to the shortfall
                // path; nothing was debited.
                Err(AppError::InsufficientStock { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        let snapshot = self.stock.snapshot(order.workstation_id).await?;
        let scenario = evaluate(&order.items, order.workstation_id, &snapshot);

        let mut dirty = order.trigger_scenario != Some(scenario);
        order.trigger_scenario = Some(scenario);

        if order.kind.can_wait_for_parts() && order.status.can_wait_for_parts() {
            order.status = OrderStatus::WaitingForParts;
            dirty = true;
        }
        if dirty {
            self.orders.update(&order).await?;
        }

        tracing::info!(
            order_number = %order.order_number,
            scenario = %scenario,
            status = %order.status,
            "Order not fulfillable from stock"
        );
        Ok(FulfillmentOutcome::Unfulfillable { order, scenario })
    }

    /// Re-evaluate every confirmed sibling at the workstation against the
    /// post-debit snapshot, persisting only the ones whose scenario changed
    async fn cascade(&self, completed: &Order) -> AppResult<usize> {
        let snapshot = self.stock.snapshot(completed.workstation_id).await?;
        let siblings = self
            .orders
            .confirmed_at_workstation(completed.workstation_id)
            .await?;

        let mut updated = 0;
        for mut sibling in siblings {
            if sibling.id == completed.id {
                continue;
            }
            let scenario = evaluate(&sibling.items, sibling.workstation_id, &snapshot);
            if sibling.trigger_scenario != Some(scenario) {
                sibling.trigger_scenario = Some(scenario);
                self.orders.update(&sibling).await?;
                updated += 1;
                tracing::debug!(
                    order_number = %sibling.order_number,
                    scenario = %scenario,
                    "Cascade re-classified sibling order"
                );
            }
        }
        Ok(updated)
    }

    /// Move a WaitingForParts parent back to Confirmed after a supply order
    /// for it completed, refreshing its cached scenario under its own
    /// workstation lock
    async fn release_waiting_parent(&self, parent_number: &str) -> AppResult<()> {
        let parent = match self.orders.get_by_number(parent_number).await {
            Ok(parent) => parent,
            Err(AppError::NotFound(_)) => {
                tracing::warn!(
                    parent_order_number = parent_number,
                    "Supply order completed but parent order not found"
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let lock = self.workstation_lock(parent.workstation_id);
        let _guard = lock.lock().await;

        let mut parent = self.orders.get(parent.id).await?;
        if parent.status != OrderStatus::WaitingForParts {
            return Ok(());
        }

        let snapshot = self.stock.snapshot(parent.workstation_id).await?;
        parent.trigger_scenario = Some(evaluate(&parent.items, parent.workstation_id, &snapshot));
        parent.status = OrderStatus::Confirmed;
        self.orders.update(&parent).await?;

        tracing::info!(
            order_number = %parent.order_number,
            "Waiting order released by supply completion"
        );
        Ok(())
    }
}
