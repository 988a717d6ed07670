//! Postgres repository implementations
//!
//! Per-key serialization of the ledger's read-modify-write uses row locks
//! (`SELECT ... FOR UPDATE`) inside a transaction; batched adjustments lock
//! keys in sorted order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use shared::{
    ItemType, LedgerEntry, Order, OrderItem, OrderKind, OrderStatus, ReasonCode, StockAdjustment,
    StockKey, TriggerScenario, MAX_STOCK_QUANTITY,
};

use crate::error::{AppError, AppResult};
use crate::repository::{LedgerFilter, OrderFilter, OrderRepository, StockRepository};

/// Postgres-backed stock store
#[derive(Clone)]
pub struct PostgresStockRepository {
    db: PgPool,
}

impl PostgresStockRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Database row for a ledger entry
#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: i64,
    workstation_id: i64,
    item_type: String,
    item_id: i64,
    delta: i64,
    balance_after: i64,
    reason_code: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = AppError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let item_type: ItemType = row.item_type.parse().map_err(AppError::Internal)?;
        let reason_code: ReasonCode = row.reason_code.parse().map_err(AppError::Internal)?;
        Ok(LedgerEntry {
            id: row.id,
            key: StockKey::new(row.workstation_id, item_type, row.item_id),
            delta: row.delta,
            balance_after: row.balance_after,
            reason_code,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl StockRepository for PostgresStockRepository {
    async fn adjust(&self, adjustment: StockAdjustment) -> AppResult<LedgerEntry> {
        let mut entries = self.adjust_many(vec![adjustment]).await?;
        entries
            .pop()
            .ok_or_else(|| AppError::Internal("Adjustment produced no ledger entry".to_string()))
    }

    async fn adjust_many(
        &self,
        mut adjustments: Vec<StockAdjustment>,
    ) -> AppResult<Vec<LedgerEntry>> {
        // Stable lock order across concurrent batches
        adjustments.sort_by_key(|a| {
            (
                a.key.workstation_id,
                a.key.item_type.as_str(),
                a.key.item_id,
            )
        });

        let mut tx = self.db.begin().await?;
        let mut working: HashMap<StockKey, i64> = HashMap::new();
        let mut entries = Vec::with_capacity(adjustments.len());

        for adjustment in adjustments {
            let balance = match working.get(&adjustment.key) {
                Some(quantity) => *quantity,
                None => sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT quantity FROM stock_records
                    WHERE workstation_id = $1 AND item_type = $2 AND item_id = $3
                    FOR UPDATE
                    "#,
                )
                .bind(adjustment.key.workstation_id)
                .bind(adjustment.key.item_type.as_str())
                .bind(adjustment.key.item_id)
                .fetch_optional(&mut *tx)
                .await?
                .unwrap_or(0),
            };

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

            sqlx::query(
                r#"
                INSERT INTO stock_records (workstation_id, item_type, item_id, quantity)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (workstation_id, item_type, item_id)
                DO UPDATE SET quantity = $4, updated_at = now()
                "#,
            )
            .bind(adjustment.key.workstation_id)
            .bind(adjustment.key.item_type.as_str())
            .bind(adjustment.key.item_id)
            .bind(new_quantity)
            .execute(&mut *tx)
            .await?;

            let row = sqlx::query_as::<_, LedgerRow>(
                r#"
                INSERT INTO stock_ledger_entries
                    (workstation_id, item_type, item_id, delta, balance_after, reason_code, notes)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, workstation_id, item_type, item_id, delta, balance_after,
                          reason_code, notes, created_at
                "#,
            )
            .bind(adjustment.key.workstation_id)
            .bind(adjustment.key.item_type.as_str())
            .bind(adjustment.key.item_id)
            .bind(adjustment.delta)
            .bind(new_quantity)
            .bind(adjustment.reason_code.as_str())
            .bind(&adjustment.notes)
            .fetch_one(&mut *tx)
            .await?;

            working.insert(adjustment.key, new_quantity);
            entries.push(LedgerEntry::try_from(row)?);
        }

        tx.commit().await?;
        Ok(entries)
    }

    async fn quantity(&self, key: StockKey) -> AppResult<i64> {
        let quantity = sqlx::query_scalar::<_, i64>(
            "SELECT quantity FROM stock_records WHERE workstation_id = $1 AND item_type = $2 AND item_id = $3",
        )
        .bind(key.workstation_id)
        .bind(key.item_type.as_str())
        .bind(key.item_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(quantity.unwrap_or(0))
    }

    async fn snapshot(&self, workstation_id: i64) -> AppResult<HashMap<StockKey, i64>> {
        let rows = sqlx::query_as::<_, (String, i64, i64)>(
            "SELECT item_type, item_id, quantity FROM stock_records WHERE workstation_id = $1",
        )
        .bind(workstation_id)
        .fetch_all(&self.db)
        .await?;

        let mut snapshot = HashMap::with_capacity(rows.len());
        for (item_type, item_id, quantity) in rows {
            let item_type: ItemType = item_type.parse().map_err(AppError::Internal)?;
            snapshot.insert(StockKey::new(workstation_id, item_type, item_id), quantity);
        }
        Ok(snapshot)
    }

    async fn history(&self, filter: LedgerFilter) -> AppResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT id, workstation_id, item_type, item_id, delta, balance_after,
                   reason_code, notes, created_at
            FROM stock_ledger_entries
            WHERE ($1::bigint IS NULL OR workstation_id = $1)
              AND ($2::text IS NULL OR item_type = $2)
              AND ($3::bigint IS NULL OR item_id = $3)
            ORDER BY id DESC
            "#,
        )
        .bind(filter.workstation_id)
        .bind(filter.item_type.map(|it| it.as_str()))
        .bind(filter.item_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    async fn recent(&self, limit: i64) -> AppResult<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT id, workstation_id, item_type, item_id, delta, balance_after,
                   reason_code, notes, created_at
            FROM stock_ledger_entries
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }
}

/// Postgres-backed order store
#[derive(Clone)]
pub struct PostgresOrderRepository {
    db: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Database row for an order
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    parent_order_number: Option<String>,
    kind: String,
    workstation_id: i64,
    items: serde_json::Value,
    status: String,
    trigger_scenario: Option<String>,
    priority: i32,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

const ORDER_COLUMNS: &str = "id, order_number, parent_order_number, kind, workstation_id, \
     items, status, trigger_scenario, priority, created_at, started_at, completed_at";

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let kind: OrderKind = row.kind.parse().map_err(AppError::Internal)?;
        let status: OrderStatus = row.status.parse().map_err(AppError::Internal)?;
        let trigger_scenario = row
            .trigger_scenario
            .map(|s| s.parse::<TriggerScenario>())
            .transpose()
            .map_err(AppError::Internal)?;
        let items: Vec<OrderItem> = serde_json::from_value(row.items)
            .map_err(|e| AppError::Internal(format!("Corrupt order items: {}", e)))?;
        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            parent_order_number: row.parent_order_number,
            kind,
            workstation_id: row.workstation_id,
            items,
            status,
            trigger_scenario,
            priority: row.priority,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn insert(&self, order: Order) -> AppResult<Order> {
        let items = serde_json::to_value(&order.items)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders
                (id, order_number, parent_order_number, kind, workstation_id,
                 items, status, trigger_scenario, priority, created_at, started_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(order.id)
        .bind(&order.order_number)
        .bind(&order.parent_order_number)
        .bind(order.kind.as_str())
        .bind(order.workstation_id)
        .bind(&items)
        .bind(order.status.as_str())
        .bind(order.trigger_scenario.map(|s| s.as_str()))
        .bind(order.priority)
        .bind(order.created_at)
        .bind(order.started_at)
        .bind(order.completed_at)
        .fetch_one(&self.db)
        .await?;

        Order::try_from(row)
    }

    async fn get(&self, id: Uuid) -> AppResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        Order::try_from(row)
    }

    async fn get_by_number(&self, order_number: &str) -> AppResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE order_number = $1",
            ORDER_COLUMNS
        ))
        .bind(order_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        Order::try_from(row)
    }

    async fn update(&self, order: &Order) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, trigger_scenario = $2, started_at = $3, completed_at = $4
            WHERE id = $5
            "#,
        )
        .bind(order.status.as_str())
        .bind(order.trigger_scenario.map(|s| s.as_str()))
        .bind(order.started_at)
        .bind(order.completed_at)
        .bind(order.id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Order".to_string()));
        }
        Ok(())
    }

    async fn list(&self, filter: OrderFilter) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE ($1::bigint IS NULL OR workstation_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR kind = $3)
            ORDER BY created_at ASC
            "#,
            ORDER_COLUMNS
        ))
        .bind(filter.workstation_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.kind.map(|k| k.as_str()))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn confirmed_at_workstation(&self, workstation_id: i64) -> AppResult<Vec<Order>> {
        self.list(OrderFilter {
            workstation_id: Some(workstation_id),
            status: Some(OrderStatus::Confirmed),
            kind: None,
        })
        .await
    }

    async fn chain(&self, base: &str) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {} FROM orders
            WHERE substring(order_number FROM position('-' IN order_number) + 1) = $1
            ORDER BY created_at ASC
            "#,
            ORDER_COLUMNS
        ))
        .bind(base)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
