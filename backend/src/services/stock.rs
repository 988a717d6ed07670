//! Stock ledger service
//!
//! Thin validation layer over the stock repository. All mutation funnels
//! through `adjust`/`adjust_many`; history queries never mutate.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use validator::Validate;

use shared::{
    validate_delta, validate_workstation_id, ItemType, LedgerEntry, ReasonCode, StockAdjustment,
    StockKey,
};

use crate::error::{AppError, AppResult};
use crate::repository::{LedgerFilter, StockRepository};

const DEFAULT_RECENT_LIMIT: i64 = 50;
const MAX_RECENT_LIMIT: i64 = 500;

/// Input for a manual stock adjustment
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustStockInput {
    #[validate(range(min = 1))]
    pub workstation_id: i64,
    pub item_type: ItemType,
    #[validate(range(min = 1))]
    pub item_id: i64,
    pub delta: i64,
    pub reason_code: ReasonCode,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Stock service for ledger adjustments and audit queries
#[derive(Clone)]
pub struct StockService {
    repo: Arc<dyn StockRepository>,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(repo: Arc<dyn StockRepository>) -> Self {
        Self { repo }
    }

    /// Apply one signed adjustment and return the journal entry
    pub async fn adjust(&self, input: AdjustStockInput) -> AppResult<LedgerEntry> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        validate_workstation_id(input.workstation_id).map_err(|msg| AppError::Validation {
            field: "workstation_id".to_string(),
            message: msg.to_string(),
        })?;
        validate_delta(input.delta).map_err(|msg| AppError::Validation {
            field: "delta".to_string(),
            message: msg.to_string(),
        })?;

        let key = StockKey::new(input.workstation_id, input.item_type, input.item_id);
        let entry = self
            .repo
            .adjust(StockAdjustment {
                key,
                delta: input.delta,
                reason_code: input.reason_code,
                notes: input.notes,
            })
            .await?;

        tracing::info!(
            key = %entry.key,
            delta = entry.delta,
            balance_after = entry.balance_after,
            reason = entry.reason_code.as_str(),
            "Stock adjusted"
        );
        Ok(entry)
    }

    /// Apply a batch of adjustments as one atomic unit
    pub async fn adjust_many(
        &self,
        adjustments: Vec<StockAdjustment>,
    ) -> AppResult<Vec<LedgerEntry>> {
        for adjustment in &adjustments {
            validate_delta(adjustment.delta).map_err(|msg| AppError::Validation {
                field: "delta".to_string(),
                message: msg.to_string(),
            })?;
        }
        self.repo.adjust_many(adjustments).await
    }

    /// Current balance for one key
    pub async fn quantity(&self, key: StockKey) -> AppResult<i64> {
        self.repo.quantity(key).await
    }

    /// Current balances for every key at a workstation
    pub async fn snapshot(&self, workstation_id: i64) -> AppResult<HashMap<StockKey, i64>> {
        self.repo.snapshot(workstation_id).await
    }

    /// Ledger history matching the filter, newest first
    pub async fn history(&self, filter: LedgerFilter) -> AppResult<Vec<LedgerEntry>> {
        self.repo.history(filter).await
    }

    /// Most recent ledger entries, newest first
    pub async fn recent(&self, limit: Option<i64>) -> AppResult<Vec<LedgerEntry>> {
        let limit = limit
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT);
        self.repo.recent(limit).await
    }
}
