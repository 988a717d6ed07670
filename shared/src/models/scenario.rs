//! Trigger scenario classification
//!
//! Pure, read-only mapping of an order's requested items against a stock
//! snapshot. The result is cached on the order and only refreshed at
//! confirmation or during a cascade pass; staleness between refreshes is
//! defined behavior, not a defect.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::order::OrderItem;
use crate::models::stock::StockKey;

/// Fulfillment classification for an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerScenario {
    /// Every requested item is available in full
    DirectFulfillment,
    /// Some, but not all, requested items are available in full
    PartialFulfillment,
    /// No requested item is available in full; source requires a downstream order
    EscalationRequired,
}

impl TriggerScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerScenario::DirectFulfillment => "direct_fulfillment",
            TriggerScenario::PartialFulfillment => "partial_fulfillment",
            TriggerScenario::EscalationRequired => "escalation_required",
        }
    }
}

impl std::str::FromStr for TriggerScenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct_fulfillment" => Ok(TriggerScenario::DirectFulfillment),
            "partial_fulfillment" => Ok(TriggerScenario::PartialFulfillment),
            "escalation_required" => Ok(TriggerScenario::EscalationRequired),
            other => Err(format!("unknown trigger scenario: {}", other)),
        }
    }
}

impl std::fmt::Display for TriggerScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify an order's items against a stock snapshot.
///
/// Availability is evaluated item by item, independently: an item is
/// available iff the snapshot quantity for its key covers the full requested
/// quantity. A single unavailable item downgrades the order to at best
/// partial fulfillment. Absent keys read as zero.
pub fn evaluate(
    items: &[OrderItem],
    workstation_id: i64,
    snapshot: &HashMap<StockKey, i64>,
) -> TriggerScenario {
    let available = items
        .iter()
        .filter(|item| {
            snapshot
                .get(&item.stock_key(workstation_id))
                .copied()
                .unwrap_or(0)
                >= item.quantity
        })
        .count();

    if available == items.len() {
        TriggerScenario::DirectFulfillment
    } else if available == 0 {
        TriggerScenario::EscalationRequired
    } else {
        TriggerScenario::PartialFulfillment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stock::ItemType;

    fn item(id: i64, quantity: i64) -> OrderItem {
        OrderItem::new(ItemType::Part, id, quantity)
    }

    fn snapshot(entries: &[(i64, i64)]) -> HashMap<StockKey, i64> {
        entries
            .iter()
            .map(|(id, qty)| (StockKey::new(7, ItemType::Part, *id), *qty))
            .collect()
    }

    #[test]
    fn test_all_available_is_direct() {
        let items = vec![item(1, 5), item(2, 2)];
        let snap = snapshot(&[(1, 5), (2, 10)]);
        assert_eq!(
            evaluate(&items, 7, &snap),
            TriggerScenario::DirectFulfillment
        );
    }

    #[test]
    fn test_none_available_is_escalation() {
        let items = vec![item(1, 5), item(2, 2)];
        let snap = snapshot(&[(1, 4), (2, 1)]);
        assert_eq!(
            evaluate(&items, 7, &snap),
            TriggerScenario::EscalationRequired
        );
    }

    #[test]
    fn test_some_available_is_partial() {
        // P requests 5 with 3 in stock, Q requests 2 with 10 in stock
        let items = vec![item(1, 5), item(2, 2)];
        let snap = snapshot(&[(1, 3), (2, 10)]);
        assert_eq!(
            evaluate(&items, 7, &snap),
            TriggerScenario::PartialFulfillment
        );
    }

    #[test]
    fn test_missing_key_reads_as_zero() {
        let items = vec![item(1, 1)];
        let snap = snapshot(&[]);
        assert_eq!(
            evaluate(&items, 7, &snap),
            TriggerScenario::EscalationRequired
        );
    }

    #[test]
    fn test_single_zero_item_downgrades() {
        // One empty pool in an otherwise fulfillable order is never direct
        let items = vec![item(1, 5), item(2, 2), item(3, 1)];
        let snap = snapshot(&[(1, 100), (2, 100), (3, 0)]);
        assert_eq!(
            evaluate(&items, 7, &snap),
            TriggerScenario::PartialFulfillment
        );
    }

    #[test]
    fn test_exact_quantity_is_available() {
        let items = vec![item(1, 5)];
        let snap = snapshot(&[(1, 5)]);
        assert_eq!(
            evaluate(&items, 7, &snap),
            TriggerScenario::DirectFulfillment
        );
    }

    #[test]
    fn test_other_workstation_stock_does_not_count() {
        let items = vec![item(1, 5)];
        let mut snap = HashMap::new();
        snap.insert(StockKey::new(8, ItemType::Part, 1), 50);
        assert_eq!(
            evaluate(&items, 7, &snap),
            TriggerScenario::EscalationRequired
        );
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let items = vec![item(1, 5), item(2, 2)];
        let snap = snapshot(&[(1, 3), (2, 10)]);
        let first = evaluate(&items, 7, &snap);
        for _ in 0..10 {
            assert_eq!(evaluate(&items, 7, &snap), first);
        }
    }
}
