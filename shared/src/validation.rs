//! Validation utilities for the Factory Order Management Platform

use crate::models::order::{OrderItem, OrderKind};
use crate::models::stock::MAX_STOCK_QUANTITY;

/// Validate a requested item quantity (1 to MAX_STOCK_QUANTITY)
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity < 1 {
        return Err("Quantity must be at least 1");
    }
    if quantity > MAX_STOCK_QUANTITY {
        return Err("Quantity exceeds maximum stock quantity");
    }
    Ok(())
}

/// Validate a signed ledger delta
pub fn validate_delta(delta: i64) -> Result<(), &'static str> {
    if delta == 0 {
        return Err("Delta must be non-zero");
    }
    if delta.abs() > MAX_STOCK_QUANTITY {
        return Err("Delta exceeds maximum stock quantity");
    }
    Ok(())
}

/// Validate a workstation identifier
pub fn validate_workstation_id(workstation_id: i64) -> Result<(), &'static str> {
    if workstation_id < 1 {
        return Err("Workstation id must be positive");
    }
    Ok(())
}

/// Validate an order's item list: non-empty, valid quantities, no duplicate keys
pub fn validate_order_items(items: &[OrderItem]) -> Result<(), &'static str> {
    if items.is_empty() {
        return Err("Order must contain at least one item");
    }
    for item in items {
        validate_quantity(item.quantity)?;
        if item.item_id < 1 {
            return Err("Item id must be positive");
        }
    }
    let mut keys: Vec<(i64, &str)> = items
        .iter()
        .map(|i| (i.item_id, i.item_type.as_str()))
        .collect();
    keys.sort();
    keys.dedup();
    if keys.len() != items.len() {
        return Err("Order items must not repeat the same item");
    }
    Ok(())
}

/// Validate order priority (0 = lowest, 100 = highest)
pub fn validate_priority(priority: i32) -> Result<(), &'static str> {
    if !(0..=100).contains(&priority) {
        return Err("Priority must be between 0 and 100");
    }
    Ok(())
}

/// Validate kind/parent coherence: customer orders root a chain, all other
/// kinds must name a parent
pub fn validate_parent_for_kind(
    kind: OrderKind,
    parent_order_number: Option<&str>,
) -> Result<(), &'static str> {
    match (kind.requires_parent(), parent_order_number) {
        (true, None) => Err("This order kind requires a parent order number"),
        (false, Some(_)) => Err("Customer orders must not have a parent order number"),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::stock::ItemType;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999_999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(1_000_000).is_err());
    }

    #[test]
    fn test_validate_delta() {
        assert!(validate_delta(5).is_ok());
        assert!(validate_delta(-5).is_ok());
        assert!(validate_delta(0).is_err());
        assert!(validate_delta(1_000_000).is_err());
        assert!(validate_delta(-1_000_000).is_err());
    }

    #[test]
    fn test_validate_workstation_id() {
        assert!(validate_workstation_id(1).is_ok());
        assert!(validate_workstation_id(0).is_err());
        assert!(validate_workstation_id(-1).is_err());
    }

    #[test]
    fn test_validate_order_items_non_empty() {
        assert!(validate_order_items(&[]).is_err());
        let items = vec![OrderItem::new(ItemType::Part, 1, 5)];
        assert!(validate_order_items(&items).is_ok());
    }

    #[test]
    fn test_validate_order_items_rejects_bad_quantity() {
        let items = vec![OrderItem::new(ItemType::Part, 1, 0)];
        assert!(validate_order_items(&items).is_err());
    }

    #[test]
    fn test_validate_order_items_rejects_duplicates() {
        let items = vec![
            OrderItem::new(ItemType::Part, 1, 5),
            OrderItem::new(ItemType::Part, 1, 3),
        ];
        assert!(validate_order_items(&items).is_err());

        // Same id under a different item type is a different pool
        let items = vec![
            OrderItem::new(ItemType::Part, 1, 5),
            OrderItem::new(ItemType::Module, 1, 3),
        ];
        assert!(validate_order_items(&items).is_ok());
    }

    #[test]
    fn test_validate_priority() {
        assert!(validate_priority(0).is_ok());
        assert!(validate_priority(100).is_ok());
        assert!(validate_priority(-1).is_err());
        assert!(validate_priority(101).is_err());
    }

    #[test]
    fn test_validate_parent_for_kind() {
        assert!(validate_parent_for_kind(OrderKind::Customer, None).is_ok());
        assert!(validate_parent_for_kind(OrderKind::Customer, Some("WH-X")).is_err());
        assert!(validate_parent_for_kind(OrderKind::Warehouse, Some("CO-X")).is_ok());
        assert!(validate_parent_for_kind(OrderKind::Warehouse, None).is_err());
        assert!(validate_parent_for_kind(OrderKind::Supply, None).is_err());
    }
}
