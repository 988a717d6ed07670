//! HTTP handlers for the Factory Order Management Platform

pub mod health;
pub mod order;
pub mod stock;

pub use health::*;
pub use order::*;
pub use stock::*;
