//! Order chain identity
//!
//! Every order derived from one root customer order carries the same base
//! token after its kind prefix (e.g. "CO-A1B2C3D4" -> "WH-A1B2C3D4"), so the
//! whole chain correlates in O(1) without a join. A malformed source number
//! is a hard error: substituting a fresh token would silently sever the
//! chain.

use thiserror::Error;

use crate::models::order::OrderKind;

/// Separator between kind prefix and base token
pub const ORDER_NUMBER_SEPARATOR: char = '-';

/// Length of the random base token
pub const BASE_TOKEN_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderNumberError {
    #[error("malformed order number: {0}")]
    Malformed(String),
}

/// Source of fresh base tokens; injectable for deterministic tests
pub trait TokenSource: Send + Sync {
    fn token(&self) -> String;
}

/// Default token source backed by uuid v4
#[derive(Debug, Default, Clone)]
pub struct UuidTokenSource;

impl TokenSource for UuidTokenSource {
    fn token(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()[..BASE_TOKEN_LEN].to_uppercase()
    }
}

/// Fixed token source for tests
#[derive(Debug, Clone)]
pub struct FixedTokenSource(pub String);

impl TokenSource for FixedTokenSource {
    fn token(&self) -> String {
        self.0.clone()
    }
}

/// Generate a fresh root order number for a customer order
pub fn new_root_order_number(source: &dyn TokenSource) -> String {
    format!(
        "{}{}{}",
        OrderKind::Customer.prefix(),
        ORDER_NUMBER_SEPARATOR,
        source.token()
    )
}

/// Extract the base token shared by every order in a chain
pub fn base_token(order_number: &str) -> Result<&str, OrderNumberError> {
    let (_, base) = order_number
        .split_once(ORDER_NUMBER_SEPARATOR)
        .ok_or_else(|| OrderNumberError::Malformed(order_number.to_string()))?;
    if base.is_empty() {
        return Err(OrderNumberError::Malformed(order_number.to_string()));
    }
    Ok(base)
}

/// Derive a correlated order number for a downstream order
///
/// Reuses the source's base token under the target prefix, e.g.
/// `derive_order_number("CO-A1B2C3D4", "WH")` yields `"WH-A1B2C3D4"`.
pub fn derive_order_number(
    source_order_number: &str,
    target_prefix: &str,
) -> Result<String, OrderNumberError> {
    let base = base_token(source_order_number)?;
    Ok(format!(
        "{}{}{}",
        target_prefix, ORDER_NUMBER_SEPARATOR, base
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_number_uses_customer_prefix() {
        let source = FixedTokenSource("A1B2C3D4".to_string());
        assert_eq!(new_root_order_number(&source), "CO-A1B2C3D4");
    }

    #[test]
    fn test_uuid_token_shape() {
        let source = UuidTokenSource;
        let token = source.token();
        assert_eq!(token.len(), BASE_TOKEN_LEN);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_derive_reuses_base() {
        assert_eq!(
            derive_order_number("CO-A1B2C3D4", "WH").unwrap(),
            "WH-A1B2C3D4"
        );
        assert_eq!(
            derive_order_number("WH-A1B2C3D4", "SU").unwrap(),
            "SU-A1B2C3D4"
        );
    }

    #[test]
    fn test_derive_keeps_extra_separators_in_base() {
        // Base is everything after the first separator
        assert_eq!(
            derive_order_number("CO-A1B2-C3D4", "PR").unwrap(),
            "PR-A1B2-C3D4"
        );
    }

    #[test]
    fn test_malformed_source_fails() {
        assert!(matches!(
            derive_order_number("COA1B2C3D4", "WH"),
            Err(OrderNumberError::Malformed(_))
        ));
        assert!(matches!(
            derive_order_number("CO-", "WH"),
            Err(OrderNumberError::Malformed(_))
        ));
        assert!(matches!(
            derive_order_number("", "WH"),
            Err(OrderNumberError::Malformed(_))
        ));
    }

    #[test]
    fn test_chain_shares_base_token() {
        let source = FixedTokenSource("FEEDBEEF".to_string());
        let root = new_root_order_number(&source);
        let warehouse = derive_order_number(&root, "WH").unwrap();
        let supply = derive_order_number(&warehouse, "SU").unwrap();
        assert_eq!(base_token(&root).unwrap(), "FEEDBEEF");
        assert_eq!(base_token(&warehouse).unwrap(), "FEEDBEEF");
        assert_eq!(base_token(&supply).unwrap(), "FEEDBEEF");
    }
}
