//! Repository interfaces for the platform aggregates
//!
//! Persistence is an implementation detail behind one trait per aggregate.
//! The in-memory store backs tests and database-less deployments; the
//! Postgres store is the production backend.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use shared::{ItemType, LedgerEntry, Order, OrderKind, OrderStatus, StockAdjustment, StockKey};

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryOrderRepository, MemoryStockRepository};
pub use postgres::{PostgresOrderRepository, PostgresStockRepository};

/// Filter for ledger history queries
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub workstation_id: Option<i64>,
    pub item_type: Option<ItemType>,
    pub item_id: Option<i64>,
}

/// Filter for order list queries
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub workstation_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub kind: Option<OrderKind>,
}

/// Stock aggregate: materialized balances plus the append-only ledger
///
/// Implementations must serialize the read-modify-write in `adjust` per key,
/// and `adjust_many` must be all-or-nothing: either every line is applied and
/// journaled, or nothing is.
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Apply one signed delta and append the journal entry atomically.
    /// Rejects adjustments that would drive the balance below zero or above
    /// the quantity bound.
    async fn adjust(&self, adjustment: StockAdjustment) -> AppResult<LedgerEntry>;

    /// Apply a batch of deltas as one atomic unit
    async fn adjust_many(&self, adjustments: Vec<StockAdjustment>) -> AppResult<Vec<LedgerEntry>>;

    /// Current balance for one key; absent records read as zero
    async fn quantity(&self, key: StockKey) -> AppResult<i64>;

    /// Current balances for every key at one workstation
    async fn snapshot(&self, workstation_id: i64) -> AppResult<HashMap<StockKey, i64>>;

    /// Ledger entries matching the filter, newest first
    async fn history(&self, filter: LedgerFilter) -> AppResult<Vec<LedgerEntry>>;

    /// Most recent ledger entries across all keys, newest first
    async fn recent(&self, limit: i64) -> AppResult<Vec<LedgerEntry>>;
}

/// Order aggregate
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: Order) -> AppResult<Order>;

    async fn get(&self, id: Uuid) -> AppResult<Order>;

    async fn get_by_number(&self, order_number: &str) -> AppResult<Order>;

    /// Persist the mutable fields (status, scenario, timestamps) of an order
    async fn update(&self, order: &Order) -> AppResult<()>;

    async fn list(&self, filter: OrderFilter) -> AppResult<Vec<Order>>;

    /// Confirmed orders waiting at one workstation
    async fn confirmed_at_workstation(&self, workstation_id: i64) -> AppResult<Vec<Order>>;

    /// All orders in the chain identified by one base token
    async fn chain(&self, base: &str) -> AppResult<Vec<Order>>;
}
