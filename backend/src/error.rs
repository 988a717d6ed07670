//! Error handling for the Factory Order Management Platform
//!
//! Business-expected conditions (stock shortfall during fulfillment) are
//! handled locally and surfaced as data; everything here is a structural
//! violation with a machine-readable code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{OrderNumberError, OrderStatus, StockKey};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Lookup errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Malformed order number: {0}")]
    InvalidOrderNumber(String),

    // Business logic errors
    #[error("Invalid order state: cannot move from {current} to {attempted}")]
    InvalidOrderState {
        current: OrderStatus,
        attempted: OrderStatus,
    },

    #[error("Insufficient stock for {key}: available {available}, requested {requested}")]
    InsufficientStock {
        key: StockKey,
        available: i64,
        requested: i64,
    },

    // External service errors
    #[error("Downstream order service timed out")]
    DownstreamTimeout,

    #[error("Downstream order service unavailable: {0}")]
    DownstreamUnavailable(String),

    #[error("Downstream order service rejected the request: {0}")]
    DownstreamRejected(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<OrderNumberError> for AppError {
    fn from(err: OrderNumberError) -> Self {
        match err {
            OrderNumberError::Malformed(number) => AppError::InvalidOrderNumber(number),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                    details: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                    details: None,
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                    details: None,
                },
            ),
            AppError::InvalidOrderNumber(number) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_ORDER_NUMBER".to_string(),
                    message: format!("Order number {:?} is malformed", number),
                    field: Some("order_number".to_string()),
                    details: None,
                },
            ),
            AppError::InvalidOrderState { current, attempted } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_ORDER_STATE".to_string(),
                    message: self.to_string(),
                    field: None,
                    details: Some(serde_json::json!({
                        "current": current,
                        "attempted": attempted,
                    })),
                },
            ),
            AppError::InsufficientStock {
                key,
                available,
                requested,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: self.to_string(),
                    field: None,
                    details: Some(serde_json::json!({
                        "key": key,
                        "available": available,
                        "requested": requested,
                    })),
                },
            ),
            AppError::DownstreamTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorDetail {
                    code: "DOWNSTREAM_TIMEOUT".to_string(),
                    message: "Downstream order service timed out".to_string(),
                    field: None,
                    details: None,
                },
            ),
            AppError::DownstreamUnavailable(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "DOWNSTREAM_UNAVAILABLE".to_string(),
                    message: format!("Downstream order service unavailable: {}", msg),
                    field: None,
                    details: None,
                },
            ),
            AppError::DownstreamRejected(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "DOWNSTREAM_REJECTED".to_string(),
                    message: format!("Downstream order service rejected the request: {}", msg),
                    field: None,
                    details: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message: format!("Configuration error: {}", msg),
                    field: None,
                    details: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                    details: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                    details: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                    details: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
