//! Downstream order-creation collaborator
//!
//! The core never creates warehouse/production/assembly orders itself; it
//! hands an unfulfillable order to this collaborator. Errors are typed so
//! the orchestrator can tell "no stock" apart from "collaborator down", and
//! the collaborator is only ever invoked after the local transaction has
//! committed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared::{OrderItem, TriggerScenario};

use crate::config::DownstreamConfig;

#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("downstream request timed out")]
    Timeout,

    #[error("downstream service unavailable: {0}")]
    Unavailable(String),

    #[error("downstream resource not found")]
    NotFound,

    #[error("downstream rejected the request: {0}")]
    Rejected(String),
}

impl From<DownstreamError> for crate::error::AppError {
    fn from(err: DownstreamError) -> Self {
        match err {
            DownstreamError::Timeout => crate::error::AppError::DownstreamTimeout,
            DownstreamError::Unavailable(msg) => crate::error::AppError::DownstreamUnavailable(msg),
            DownstreamError::NotFound => {
                crate::error::AppError::DownstreamUnavailable("endpoint not found".to_string())
            }
            DownstreamError::Rejected(msg) => crate::error::AppError::DownstreamRejected(msg),
        }
    }
}

/// Request to create a correlated downstream order
#[derive(Debug, Clone, Serialize)]
pub struct DownstreamOrderRequest {
    pub scenario: TriggerScenario,
    pub source_order_number: String,
    pub workstation_id: i64,
    /// Items the source order could not cover from stock
    pub missing_items: Vec<OrderItem>,
}

/// Reference to the order the collaborator created (if any)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamOrderRef {
    pub order_number: Option<String>,
}

#[async_trait]
pub trait DownstreamOrderClient: Send + Sync {
    async fn create_downstream(
        &self,
        request: DownstreamOrderRequest,
    ) -> Result<DownstreamOrderRef, DownstreamError>;
}

/// HTTP implementation of the downstream collaborator
pub struct HttpDownstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDownstreamClient {
    pub fn new(config: &DownstreamConfig) -> Result<Self, DownstreamError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DownstreamError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DownstreamOrderClient for HttpDownstreamClient {
    async fn create_downstream(
        &self,
        request: DownstreamOrderRequest,
    ) -> Result<DownstreamOrderRef, DownstreamError> {
        let url = format!("{}/api/v1/downstream-orders", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DownstreamError::Timeout
                } else {
                    DownstreamError::Unavailable(e.to_string())
                }
            })?;

        match response.status() {
            status if status.is_success() => response
                .json::<DownstreamOrderRef>()
                .await
                .map_err(|e| DownstreamError::Unavailable(e.to_string())),
            reqwest::StatusCode::NOT_FOUND => Err(DownstreamError::NotFound),
            status if status.is_client_error() => {
                let body = response.text().await.unwrap_or_default();
                Err(DownstreamError::Rejected(format!("{}: {}", status, body)))
            }
            status => Err(DownstreamError::Unavailable(status.to_string())),
        }
    }
}

/// No-op collaborator for deployments without downstream order creation
#[derive(Debug, Default, Clone)]
pub struct NoopDownstreamClient;

#[async_trait]
impl DownstreamOrderClient for NoopDownstreamClient {
    async fn create_downstream(
        &self,
        request: DownstreamOrderRequest,
    ) -> Result<DownstreamOrderRef, DownstreamError> {
        tracing::info!(
            source_order = %request.source_order_number,
            scenario = %request.scenario,
            "Downstream order creation disabled; enqueue skipped"
        );
        Ok(DownstreamOrderRef { order_number: None })
    }
}
