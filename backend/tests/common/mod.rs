//! Shared fixtures for backend integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use factory_order_backend::error::AppResult;
use factory_order_backend::external::{
    DownstreamError, DownstreamOrderClient, DownstreamOrderRef, DownstreamOrderRequest,
};
use factory_order_backend::repository::{
    MemoryOrderRepository, MemoryStockRepository, OrderFilter, OrderRepository, StockRepository,
};
use factory_order_backend::services::order::CreateOrderInput;
use factory_order_backend::services::{FulfillmentService, OrderService, StockService};
use shared::{
    ItemType, Order, OrderItem, OrderKind, ReasonCode, StockAdjustment, StockKey, UuidTokenSource,
};

/// Downstream collaborator that records every request it receives
#[derive(Default)]
pub struct RecordingDownstreamClient {
    pub requests: Mutex<Vec<DownstreamOrderRequest>>,
    pub fail_unavailable: AtomicBool,
}

#[async_trait]
impl DownstreamOrderClient for RecordingDownstreamClient {
    async fn create_downstream(
        &self,
        request: DownstreamOrderRequest,
    ) -> Result<DownstreamOrderRef, DownstreamError> {
        self.requests.lock().unwrap().push(request);
        if self.fail_unavailable.load(Ordering::SeqCst) {
            return Err(DownstreamError::Unavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(DownstreamOrderRef {
            order_number: Some("WH-RECORDED".to_string()),
        })
    }
}

/// Order repository decorator that counts persisted updates
pub struct CountingOrderRepository {
    inner: MemoryOrderRepository,
    pub updates: AtomicUsize,
}

impl CountingOrderRepository {
    pub fn new() -> Self {
        Self {
            inner: MemoryOrderRepository::new(),
            updates: AtomicUsize::new(0),
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderRepository for CountingOrderRepository {
    async fn insert(&self, order: Order) -> AppResult<Order> {
        self.inner.insert(order).await
    }

    async fn get(&self, id: Uuid) -> AppResult<Order> {
        self.inner.get(id).await
    }

    async fn get_by_number(&self, order_number: &str) -> AppResult<Order> {
        self.inner.get_by_number(order_number).await
    }

    async fn update(&self, order: &Order) -> AppResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(order).await
    }

    async fn list(&self, filter: OrderFilter) -> AppResult<Vec<Order>> {
        self.inner.list(filter).await
    }

    async fn confirmed_at_workstation(&self, workstation_id: i64) -> AppResult<Vec<Order>> {
        self.inner.confirmed_at_workstation(workstation_id).await
    }

    async fn chain(&self, base: &str) -> AppResult<Vec<Order>> {
        self.inner.chain(base).await
    }
}

/// Fully wired services over in-memory stores
pub struct TestApp {
    pub stock_repo: Arc<MemoryStockRepository>,
    pub order_repo: Arc<CountingOrderRepository>,
    pub orders: OrderService,
    pub stock: StockService,
    pub fulfillment: FulfillmentService,
    pub downstream: Arc<RecordingDownstreamClient>,
}

pub fn test_app() -> TestApp {
    let stock_repo = Arc::new(MemoryStockRepository::new());
    let order_repo = Arc::new(CountingOrderRepository::new());
    let downstream = Arc::new(RecordingDownstreamClient::default());

    let orders = OrderService::new(
        order_repo.clone(),
        stock_repo.clone(),
        Arc::new(UuidTokenSource),
        downstream.clone(),
    );
    let stock = StockService::new(stock_repo.clone());
    let fulfillment = FulfillmentService::new(order_repo.clone(), stock_repo.clone());

    TestApp {
        stock_repo,
        order_repo,
        orders,
        stock,
        fulfillment,
        downstream,
    }
}

pub fn part(item_id: i64, quantity: i64) -> OrderItem {
    OrderItem::new(ItemType::Part, item_id, quantity)
}

pub fn key(workstation_id: i64, item_id: i64) -> StockKey {
    StockKey::new(workstation_id, ItemType::Part, item_id)
}

/// Seed stock for one part at a workstation
pub async fn seed_stock(app: &TestApp, workstation_id: i64, item_id: i64, quantity: i64) {
    app.stock_repo
        .adjust(StockAdjustment {
            key: key(workstation_id, item_id),
            delta: quantity,
            reason_code: ReasonCode::InitialStock,
            notes: None,
        })
        .await
        .expect("seeding stock");
}

/// Create a pending customer order
pub async fn customer_order(app: &TestApp, workstation_id: i64, items: Vec<OrderItem>) -> Order {
    app.orders
        .create_order(CreateOrderInput {
            kind: OrderKind::Customer,
            parent_order_number: None,
            workstation_id,
            items,
            priority: None,
        })
        .await
        .expect("creating customer order")
}

/// Create and confirm a customer order
pub async fn confirmed_order(app: &TestApp, workstation_id: i64, items: Vec<OrderItem>) -> Order {
    let order = customer_order(app, workstation_id, items).await;
    app.orders
        .confirm_order(order.id)
        .await
        .expect("confirming order")
}

/// Create and confirm a child order of the given kind
pub async fn confirmed_child(
    app: &TestApp,
    kind: OrderKind,
    parent_order_number: &str,
    workstation_id: i64,
    items: Vec<OrderItem>,
) -> Order {
    let order = app
        .orders
        .create_order(CreateOrderInput {
            kind,
            parent_order_number: Some(parent_order_number.to_string()),
            workstation_id,
            items,
            priority: None,
        })
        .await
        .expect("creating child order");
    app.orders
        .confirm_order(order.id)
        .await
        .expect("confirming child order")
}
