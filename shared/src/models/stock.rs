//! Stock and ledger models
//!
//! Stock quantities are only ever changed through ledger adjustments; the
//! materialized `StockRecord` is a running balance, never recomputed from
//! scratch in steady state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound for any stock quantity
pub const MAX_STOCK_QUANTITY: i64 = 999_999;

/// Kind of item held in stock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Product,
    Module,
    Part,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Product => "product",
            ItemType::Module => "module",
            ItemType::Part => "part",
        }
    }
}

impl std::str::FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product" => Ok(ItemType::Product),
            "module" => Ok(ItemType::Module),
            "part" => Ok(ItemType::Part),
            other => Err(format!("unknown item type: {}", other)),
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies one fungible inventory pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub workstation_id: i64,
    pub item_type: ItemType,
    pub item_id: i64,
}

impl StockKey {
    pub fn new(workstation_id: i64, item_type: ItemType, item_id: i64) -> Self {
        Self {
            workstation_id,
            item_type,
            item_id,
        }
    }
}

impl std::fmt::Display for StockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ws{}/{}:{}",
            self.workstation_id, self.item_type, self.item_id
        )
    }
}

/// Materialized current balance for one stock key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    pub key: StockKey,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

/// Why a ledger adjustment happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Fulfillment,
    ProductionCompleted,
    SupplyReceived,
    Adjustment,
    InitialStock,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Fulfillment => "fulfillment",
            ReasonCode::ProductionCompleted => "production_completed",
            ReasonCode::SupplyReceived => "supply_received",
            ReasonCode::Adjustment => "adjustment",
            ReasonCode::InitialStock => "initial_stock",
        }
    }
}

impl std::str::FromStr for ReasonCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fulfillment" => Ok(ReasonCode::Fulfillment),
            "production_completed" => Ok(ReasonCode::ProductionCompleted),
            "supply_received" => Ok(ReasonCode::SupplyReceived),
            "adjustment" => Ok(ReasonCode::Adjustment),
            "initial_stock" => Ok(ReasonCode::InitialStock),
            other => Err(format!("unknown reason code: {}", other)),
        }
    }
}

/// Immutable journal entry for one signed stock delta
///
/// `balance_after` of the newest entry for a key always equals the current
/// `StockRecord.quantity` for that key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub key: StockKey,
    pub delta: i64,
    pub balance_after: i64,
    pub reason_code: ReasonCode,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One requested adjustment, used singly or in all-or-nothing batches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub key: StockKey,
    pub delta: i64,
    pub reason_code: ReasonCode,
    pub notes: Option<String>,
}
