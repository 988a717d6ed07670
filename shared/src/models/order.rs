//! Order model and lifecycle state machine
//!
//! Every order subtype shares one tagged-variant `Order`; the `OrderKind`
//! discriminant replaces per-subtype classes so the fulfillment and cascade
//! logic exists exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::stock::{ItemType, StockKey};

/// Order subtype discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Customer,
    Warehouse,
    Production,
    ProductionControl,
    AssemblyControl,
    Supply,
    WorkstationProduction,
    WorkstationAssembly,
}

impl OrderKind {
    /// Order-number prefix for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            OrderKind::Customer => "CO",
            OrderKind::Warehouse => "WH",
            OrderKind::Production => "PR",
            OrderKind::ProductionControl => "PC",
            OrderKind::AssemblyControl => "AC",
            OrderKind::Supply => "SU",
            OrderKind::WorkstationProduction => "WP",
            OrderKind::WorkstationAssembly => "WA",
        }
    }

    /// Customer orders root a chain; every other kind derives from a parent
    pub fn requires_parent(&self) -> bool {
        !matches!(self, OrderKind::Customer)
    }

    /// Workstation order kinds can wait on input parts
    pub fn can_wait_for_parts(&self) -> bool {
        matches!(
            self,
            OrderKind::WorkstationProduction | OrderKind::WorkstationAssembly
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Customer => "customer",
            OrderKind::Warehouse => "warehouse",
            OrderKind::Production => "production",
            OrderKind::ProductionControl => "production_control",
            OrderKind::AssemblyControl => "assembly_control",
            OrderKind::Supply => "supply",
            OrderKind::WorkstationProduction => "workstation_production",
            OrderKind::WorkstationAssembly => "workstation_assembly",
        }
    }
}

impl std::str::FromStr for OrderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(OrderKind::Customer),
            "warehouse" => Ok(OrderKind::Warehouse),
            "production" => Ok(OrderKind::Production),
            "production_control" => Ok(OrderKind::ProductionControl),
            "assembly_control" => Ok(OrderKind::AssemblyControl),
            "supply" => Ok(OrderKind::Supply),
            "workstation_production" => Ok(OrderKind::WorkstationProduction),
            "workstation_assembly" => Ok(OrderKind::WorkstationAssembly),
            other => Err(format!("unknown order kind: {}", other)),
        }
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shared order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProgress,
    WaitingForParts,
    Completed,
    Escalated,
    Halted,
    Abandoned,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Abandoned | OrderStatus::Cancelled
        )
    }

    /// Confirming requires a freshly created order
    pub fn can_confirm(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Starting requires Pending or Confirmed
    pub fn can_start(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Completing requires Confirmed or InProgress
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::InProgress)
    }

    /// Escalating requires Confirmed
    pub fn can_escalate(&self) -> bool {
        matches!(self, OrderStatus::Confirmed)
    }

    /// Halting requires any non-terminal, non-halted status
    pub fn can_halt(&self) -> bool {
        !self.is_terminal() && *self != OrderStatus::Halted
    }

    /// Resuming requires Halted
    pub fn can_resume(&self) -> bool {
        matches!(self, OrderStatus::Halted)
    }

    /// Abandoning requires Halted
    pub fn can_abandon(&self) -> bool {
        matches!(self, OrderStatus::Halted)
    }

    /// Cancelling requires Pending or Confirmed
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Entering WaitingForParts requires Confirmed (workstation kinds only)
    pub fn can_wait_for_parts(&self) -> bool {
        matches!(self, OrderStatus::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::WaitingForParts => "waiting_for_parts",
            OrderStatus::Completed => "completed",
            OrderStatus::Escalated => "escalated",
            OrderStatus::Halted => "halted",
            OrderStatus::Abandoned => "abandoned",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "in_progress" => Ok(OrderStatus::InProgress),
            "waiting_for_parts" => Ok(OrderStatus::WaitingForParts),
            "completed" => Ok(OrderStatus::Completed),
            "escalated" => Ok(OrderStatus::Escalated),
            "halted" => Ok(OrderStatus::Halted),
            "abandoned" => Ok(OrderStatus::Abandoned),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One requested line item, immutable once the order is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_type: ItemType,
    pub item_id: i64,
    pub quantity: i64,
}

impl OrderItem {
    pub fn new(item_type: ItemType, item_id: i64, quantity: i64) -> Self {
        Self {
            item_type,
            item_id,
            quantity,
        }
    }

    /// Stock key for this item at the given workstation
    pub fn stock_key(&self, workstation_id: i64) -> StockKey {
        StockKey::new(workstation_id, self.item_type, self.item_id)
    }
}

use crate::models::scenario::TriggerScenario;

/// An order anywhere in the chain rooted at one customer order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Prefixed correlation number, e.g. "CO-A1B2C3D4"
    pub order_number: String,
    pub parent_order_number: Option<String>,
    pub kind: OrderKind,
    pub workstation_id: i64,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    /// Cached fulfillment classification; consistent with some stock snapshot
    /// taken no earlier than the last confirmation or cascade pass
    pub trigger_scenario: Option<TriggerScenario>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Stock keys for every ordered item at this order's workstation
    pub fn stock_keys(&self) -> Vec<StockKey> {
        self.items
            .iter()
            .map(|item| item.stock_key(self.workstation_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Abandoned.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Halted.is_terminal());
        assert!(!OrderStatus::Escalated.is_terminal());
    }

    #[test]
    fn test_start_guard() {
        assert!(OrderStatus::Pending.can_start());
        assert!(OrderStatus::Confirmed.can_start());
        assert!(!OrderStatus::Completed.can_start());
        assert!(!OrderStatus::Halted.can_start());
    }

    #[test]
    fn test_complete_guard() {
        assert!(OrderStatus::Confirmed.can_complete());
        assert!(OrderStatus::InProgress.can_complete());
        assert!(!OrderStatus::Pending.can_complete());
        assert!(!OrderStatus::Escalated.can_complete());
    }

    #[test]
    fn test_halt_resume_guards() {
        assert!(OrderStatus::Confirmed.can_halt());
        assert!(OrderStatus::InProgress.can_halt());
        assert!(!OrderStatus::Completed.can_halt());
        assert!(!OrderStatus::Halted.can_halt());

        assert!(OrderStatus::Halted.can_resume());
        assert!(!OrderStatus::Confirmed.can_resume());

        assert!(OrderStatus::Halted.can_abandon());
        assert!(!OrderStatus::Confirmed.can_abandon());
    }

    #[test]
    fn test_cancel_guard() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Confirmed.can_cancel());
        assert!(!OrderStatus::InProgress.can_cancel());
        assert!(!OrderStatus::Completed.can_cancel());
    }

    #[test]
    fn test_waiting_for_parts_kinds() {
        assert!(OrderKind::WorkstationProduction.can_wait_for_parts());
        assert!(OrderKind::WorkstationAssembly.can_wait_for_parts());
        assert!(!OrderKind::Customer.can_wait_for_parts());
        assert!(!OrderKind::Supply.can_wait_for_parts());
    }

    #[test]
    fn test_kind_prefixes_unique() {
        let kinds = [
            OrderKind::Customer,
            OrderKind::Warehouse,
            OrderKind::Production,
            OrderKind::ProductionControl,
            OrderKind::AssemblyControl,
            OrderKind::Supply,
            OrderKind::WorkstationProduction,
            OrderKind::WorkstationAssembly,
        ];
        let mut prefixes: Vec<&str> = kinds.iter().map(|k| k.prefix()).collect();
        prefixes.sort();
        prefixes.dedup();
        assert_eq!(prefixes.len(), kinds.len());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::InProgress,
            OrderStatus::WaitingForParts,
            OrderStatus::Completed,
            OrderStatus::Escalated,
            OrderStatus::Halted,
            OrderStatus::Abandoned,
            OrderStatus::Cancelled,
        ] {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
