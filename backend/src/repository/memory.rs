//! In-memory repository implementations
//!
//! The stock state sits behind a single async mutex, which serializes every
//! read-modify-write and makes batched adjustments trivially all-or-nothing.
//! Used by the test suite and by deployments without a database URL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use shared::{
    base_token, LedgerEntry, Order, StockAdjustment, StockKey, MAX_STOCK_QUANTITY,
};

use crate::error::{AppError, AppResult};
use crate::repository::{LedgerFilter, OrderFilter, OrderRepository, StockRepository};

#[derive(Default)]
struct StockState {
    records: HashMap<StockKey, i64>,
    ledger: Vec<LedgerEntry>,
    next_entry_id: i64,
}

impl StockState {
    /// Validate one adjustment against a working balance
    fn check(&self, balance: i64, adjustment: &StockAdjustment) -> AppResult<i64> {
        let new_quantity = balance + adjustment.delta;
        if new_quantity < 0 {
            return Err(AppError::InsufficientStock {
                key: adjustment.key,
                available: balance,
                requested: -adjustment.delta,
            });
        }
        if new_quantity > MAX_STOCK_QUANTITY {
            return Err(AppError::Validation {
                field: "delta".to_string(),
                message: format!(
                    "Adjustment would exceed maximum stock quantity for {}",
                    adjustment.key
                ),
            });
        }
        Ok(new_quantity)
    }

    /// Apply a pre-validated batch; every line lands or the caller bailed out
    fn apply(&mut self, staged: Vec<(StockAdjustment, i64)>) -> Vec<LedgerEntry> {
        let mut entries = Vec::with_capacity(staged.len());
        for (adjustment, balance_after) in staged {
            self.records.insert(adjustment.key, balance_after);
            self.next_entry_id += 1;
            let entry = LedgerEntry {
                id: self.next_entry_id,
                key: adjustment.key,
                delta: adjustment.delta,
                balance_after,
                reason_code: adjustment.reason_code,
                notes: adjustment.notes,
                created_at: Utc::now(),
            };
            self.ledger.push(entry.clone());
            entries.push(entry);
        }
        entries
    }
}

/// In-memory stock store
#[derive(Default)]
pub struct MemoryStockRepository {
    state: Mutex<StockState>,
}

impl MemoryStockRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockRepository for MemoryStockRepository {
    async fn adjust(&self, adjustment: StockAdjustment) -> AppResult<LedgerEntry> {
        let mut entries = self.adjust_many(vec![adjustment]).await?;
        entries
            .pop()
            .ok_or_else(|| AppError::Internal("Adjustment produced no ledger entry".to_string()))
    }

    async fn adjust_many(&self, adjustments: Vec<StockAdjustment>) -> AppResult<Vec<LedgerEntry>> {
        let mut state = self.state.lock().await;

        // Stage against working balances so a batch touching one key twice
        // still validates sequentially, then commit all lines at once.
        let mut working: HashMap<StockKey, i64> = HashMap::new();
        let mut staged = Vec::with_capacity(adjustments.len());
        for adjustment in adjustments {
            let balance = working
                .get(&adjustment.key)
                .copied()
                .unwrap_or_else(|| state.records.get(&adjustment.key).copied().unwrap_or(0));
            let new_quantity = state.check(balance, &adjustment)?;
            working.insert(adjustment.key, new_quantity);
            staged.push((adjustment, new_quantity));
        }

        Ok(state.apply(staged))
    }

    async fn quantity(&self, key: StockKey) -> AppResult<i64> {
        let state = self.state.lock().await;
        Ok(state.records.get(&key).copied().unwrap_or(0))
    }

    async fn snapshot(&self, workstation_id: i64) -> AppResult<HashMap<StockKey, i64>> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .iter()
            .filter(|(key, _)| key.workstation_id == workstation_id)
            .map(|(key, quantity)| (*key, *quantity))
            .collect())
    }

    async fn history(&self, filter: LedgerFilter) -> AppResult<Vec<LedgerEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<LedgerEntry> = state
            .ledger
            .iter()
            .filter(|entry| {
                filter
                    .workstation_id
                    .map_or(true, |ws| entry.key.workstation_id == ws)
                    && filter
                        .item_type
                        .map_or(true, |it| entry.key.item_type == it)
                    && filter.item_id.map_or(true, |id| entry.key.item_id == id)
            })
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(entries)
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<LedgerEntry>> {
        let state = self.state.lock().await;
        let mut entries: Vec<LedgerEntry> = state.ledger.iter().cloned().collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }
}

/// In-memory order store
#[derive(Default)]
pub struct MemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl MemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn insert(&self, order: Order) -> AppResult<Order> {
        let mut orders = self.orders.write().await;
        if orders
            .values()
            .any(|existing| existing.order_number == order.order_number)
        {
            return Err(AppError::Validation {
                field: "order_number".to_string(),
                message: format!("Order number {} already exists", order.order_number),
            });
        }
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> AppResult<Order> {
        let orders = self.orders.read().await;
        orders
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    async fn get_by_number(&self, order_number: &str) -> AppResult<Order> {
        let orders = self.orders.read().await;
        orders
            .values()
            .find(|order| order.order_number == order_number)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    async fn update(&self, order: &Order) -> AppResult<()> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Order".to_string())),
        }
    }

    async fn list(&self, filter: OrderFilter) -> AppResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|order| {
                filter
                    .workstation_id
                    .map_or(true, |ws| order.workstation_id == ws)
                    && filter.status.map_or(true, |status| order.status == status)
                    && filter.kind.map_or(true, |kind| order.kind == kind)
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    async fn confirmed_at_workstation(&self, workstation_id: i64) -> AppResult<Vec<Order>> {
        self.list(OrderFilter {
            workstation_id: Some(workstation_id),
            status: Some(shared::OrderStatus::Confirmed),
            kind: None,
        })
        .await
    }

    async fn chain(&self, base: &str) -> AppResult<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|order| base_token(&order.order_number).map_or(false, |b| b == base))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }
}
