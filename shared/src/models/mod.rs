//! Domain models for the Factory Order Management Platform

pub mod order;
pub mod scenario;
pub mod stock;

pub use order::*;
pub use scenario::*;
pub use stock::*;
