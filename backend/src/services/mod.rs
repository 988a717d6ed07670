//! Business logic services for the Factory Order Management Platform

pub mod fulfillment;
pub mod order;
pub mod stock;

pub use fulfillment::FulfillmentService;
pub use order::OrderService;
pub use stock::StockService;
