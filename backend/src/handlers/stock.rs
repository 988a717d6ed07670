//! HTTP handlers for stock ledger endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use shared::{ItemType, LedgerEntry, StockKey};

use crate::error::AppResult;
use crate::repository::LedgerFilter;
use crate::services::stock::AdjustStockInput;
use crate::AppState;

/// Query parameters for ledger history
#[derive(Debug, Deserialize, Default)]
pub struct LedgerQuery {
    pub workstation_id: Option<i64>,
    pub item_type: Option<ItemType>,
    pub item_id: Option<i64>,
}

/// Query parameters for recent ledger entries
#[derive(Debug, Deserialize, Default)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

/// One stock balance line in a workstation level report
#[derive(Debug, Serialize)]
pub struct StockLevel {
    pub item_type: ItemType,
    pub item_id: i64,
    pub quantity: i64,
}

/// Record a manual stock adjustment
pub async fn adjust_stock(
    State(state): State<AppState>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<LedgerEntry>> {
    let entry = state.stock.adjust(input).await?;
    Ok(Json(entry))
}

/// Current stock levels at one workstation
pub async fn get_stock_levels(
    State(state): State<AppState>,
    Path(workstation_id): Path<i64>,
) -> AppResult<Json<Vec<StockLevel>>> {
    let snapshot: HashMap<StockKey, i64> = state.stock.snapshot(workstation_id).await?;
    let mut levels: Vec<StockLevel> = snapshot
        .into_iter()
        .map(|(key, quantity)| StockLevel {
            item_type: key.item_type,
            item_id: key.item_id,
            quantity,
        })
        .collect();
    levels.sort_by_key(|level| (level.item_type.as_str(), level.item_id));
    Ok(Json(levels))
}

/// Ledger history matching the filter, newest first
pub async fn get_ledger(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let entries = state
        .stock
        .history(LedgerFilter {
            workstation_id: query.workstation_id,
            item_type: query.item_type,
            item_id: query.item_id,
        })
        .await?;
    Ok(Json(entries))
}

/// Most recent ledger entries across all keys
pub async fn get_recent_ledger(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<LedgerEntry>>> {
    let entries = state.stock.recent(query.limit).await?;
    Ok(Json(entries))
}
