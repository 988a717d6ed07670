//! Shared types and models for the Factory Order Management Platform
//!
//! This crate contains the order and stock domain types shared between the
//! backend and other components of the system.

pub mod models;
pub mod order_number;
pub mod validation;

pub use models::*;
pub use order_number::*;
pub use validation::*;
