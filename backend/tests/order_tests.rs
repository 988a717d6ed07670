//! Order lifecycle and chain identity tests
//!
//! Covers order creation and numbering, parent/kind coherence, every guarded
//! status transition, and escalation through the downstream collaborator.

mod common;

use std::sync::atomic::Ordering;

use common::{confirmed_child, confirmed_order, customer_order, part, seed_stock, test_app};
use factory_order_backend::error::AppError;
use factory_order_backend::repository::OrderFilter;
use factory_order_backend::services::order::CreateOrderInput;
use shared::{OrderKind, OrderStatus, TriggerScenario};

#[tokio::test]
async fn customer_order_roots_a_chain() {
    let app = test_app();
    let order = customer_order(&app, 7, vec![part(1, 5)]).await;

    assert!(order.order_number.starts_with("CO-"));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.trigger_scenario, None);
    assert_eq!(order.parent_order_number, None);
}

#[tokio::test]
async fn derived_orders_share_the_base_token() {
    let app = test_app();
    let root = confirmed_order(&app, 7, vec![part(1, 5)]).await;

    let warehouse = confirmed_child(&app, OrderKind::Warehouse, &root.order_number, 7, vec![
        part(1, 5),
    ])
    .await;
    let supply = confirmed_child(&app, OrderKind::Supply, &warehouse.order_number, 9, vec![
        part(1, 5),
    ])
    .await;

    let base = root.order_number.strip_prefix("CO-").unwrap();
    assert_eq!(warehouse.order_number, format!("WH-{}", base));
    assert_eq!(supply.order_number, format!("SU-{}", base));

    let chain = app.orders.chain(&supply.order_number).await.unwrap();
    assert_eq!(chain.len(), 3);
    assert!(chain.iter().any(|o| o.id == root.id));
    assert!(chain.iter().any(|o| o.id == warehouse.id));
}

#[tokio::test]
async fn non_customer_kind_requires_a_parent() {
    let app = test_app();

    let err = app
        .orders
        .create_order(CreateOrderInput {
            kind: OrderKind::Warehouse,
            parent_order_number: None,
            workstation_id: 7,
            items: vec![part(1, 5)],
            priority: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "parent_order_number"));
}

#[tokio::test]
async fn customer_order_must_not_have_a_parent() {
    let app = test_app();

    let err = app
        .orders
        .create_order(CreateOrderInput {
            kind: OrderKind::Customer,
            parent_order_number: Some("CO-A1B2C3D4".to_string()),
            workstation_id: 7,
            items: vec![part(1, 5)],
            priority: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
}

#[tokio::test]
async fn malformed_parent_number_fails_loudly() {
    let app = test_app();

    let err = app
        .orders
        .create_order(CreateOrderInput {
            kind: OrderKind::Warehouse,
            parent_order_number: Some("NOSEPARATOR".to_string()),
            workstation_id: 7,
            items: vec![part(1, 5)],
            priority: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidOrderNumber(_)));
}

#[tokio::test]
async fn duplicate_derived_number_is_rejected() {
    let app = test_app();
    let root = customer_order(&app, 7, vec![part(1, 5)]).await;

    let input = || CreateOrderInput {
        kind: OrderKind::Warehouse,
        parent_order_number: Some(root.order_number.clone()),
        workstation_id: 7,
        items: vec![part(1, 5)],
        priority: None,
    };

    app.orders.create_order(input()).await.unwrap();
    let err = app.orders.create_order(input()).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "order_number"));
}

#[tokio::test]
async fn empty_items_are_rejected() {
    let app = test_app();

    let err = app
        .orders
        .create_order(CreateOrderInput {
            kind: OrderKind::Customer,
            parent_order_number: None,
            workstation_id: 7,
            items: vec![],
            priority: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "items"));
}

#[tokio::test]
async fn confirm_classifies_against_current_stock() {
    let app = test_app();
    seed_stock(&app, 7, 1, 5).await;
    seed_stock(&app, 7, 2, 10).await;

    let direct = confirmed_order(&app, 7, vec![part(1, 5), part(2, 2)]).await;
    assert_eq!(direct.status, OrderStatus::Confirmed);
    assert_eq!(
        direct.trigger_scenario,
        Some(TriggerScenario::DirectFulfillment)
    );

    let escalation = confirmed_order(&app, 8, vec![part(1, 5)]).await;
    assert_eq!(
        escalation.trigger_scenario,
        Some(TriggerScenario::EscalationRequired)
    );
}

#[tokio::test]
async fn confirm_is_not_repeatable() {
    let app = test_app();
    let order = confirmed_order(&app, 7, vec![part(1, 5)]).await;

    let err = app.orders.confirm_order(order.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidOrderState {
            current: OrderStatus::Confirmed,
            attempted: OrderStatus::Confirmed,
        }
    ));
}

#[tokio::test]
async fn start_halt_resume_abandon_path() {
    let app = test_app();
    let order = confirmed_order(&app, 7, vec![part(1, 5)]).await;

    let started = app.orders.start_order(order.id).await.unwrap();
    assert_eq!(started.status, OrderStatus::InProgress);
    assert!(started.started_at.is_some());

    let halted = app.orders.halt_order(order.id).await.unwrap();
    assert_eq!(halted.status, OrderStatus::Halted);

    let resumed = app.orders.resume_order(order.id).await.unwrap();
    assert_eq!(resumed.status, OrderStatus::Confirmed);

    app.orders.halt_order(order.id).await.unwrap();
    let abandoned = app.orders.abandon_order(order.id).await.unwrap();
    assert_eq!(abandoned.status, OrderStatus::Abandoned);

    // Terminal: nothing moves an abandoned order
    assert!(app.orders.start_order(order.id).await.is_err());
    assert!(app.orders.halt_order(order.id).await.is_err());
    assert!(app.orders.resume_order(order.id).await.is_err());
}

#[tokio::test]
async fn abandon_requires_halted() {
    let app = test_app();
    let order = confirmed_order(&app, 7, vec![part(1, 5)]).await;

    let err = app.orders.abandon_order(order.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOrderState { .. }));
}

#[tokio::test]
async fn cancel_only_before_work_starts() {
    let app = test_app();

    let pending = customer_order(&app, 7, vec![part(1, 5)]).await;
    let cancelled = app.orders.cancel_order(pending.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let started = confirmed_order(&app, 7, vec![part(1, 5)]).await;
    app.orders.start_order(started.id).await.unwrap();
    let err = app.orders.cancel_order(started.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOrderState { .. }));
}

#[tokio::test]
async fn escalate_sends_missing_items_downstream() {
    let app = test_app();
    seed_stock(&app, 7, 1, 5).await;

    // Item 1 is covered, item 2 is not
    let order = confirmed_order(&app, 7, vec![part(1, 5), part(2, 3)]).await;
    let escalated = app.orders.escalate_order(order.id).await.unwrap();

    assert_eq!(escalated.status, OrderStatus::Escalated);
    assert_eq!(
        escalated.trigger_scenario,
        Some(TriggerScenario::PartialFulfillment)
    );

    let requests = app.downstream.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].source_order_number, order.order_number);
    assert_eq!(requests[0].workstation_id, 7);
    assert_eq!(requests[0].missing_items, vec![part(2, 3)]);
}

#[tokio::test]
async fn escalate_commits_before_downstream_failure() {
    let app = test_app();
    app.downstream.fail_unavailable.store(true, Ordering::SeqCst);

    let order = confirmed_order(&app, 7, vec![part(1, 5)]).await;
    let err = app.orders.escalate_order(order.id).await.unwrap_err();
    assert!(matches!(err, AppError::DownstreamUnavailable(_)));

    // The transition already committed; only the enqueue needs a retry
    let stored = app.orders.get_order(order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Escalated);
}

#[tokio::test]
async fn escalate_requires_confirmed() {
    let app = test_app();
    let pending = customer_order(&app, 7, vec![part(1, 5)]).await;

    let err = app.orders.escalate_order(pending.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOrderState { .. }));
    assert!(app.downstream.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn list_orders_filters_by_workstation_status_and_kind() {
    let app = test_app();
    let a = confirmed_order(&app, 7, vec![part(1, 5)]).await;
    let _b = customer_order(&app, 7, vec![part(1, 5)]).await;
    let _c = confirmed_order(&app, 8, vec![part(1, 5)]).await;

    let confirmed_ws7 = app
        .orders
        .list_orders(OrderFilter {
            workstation_id: Some(7),
            status: Some(OrderStatus::Confirmed),
            kind: None,
        })
        .await
        .unwrap();
    assert_eq!(confirmed_ws7.len(), 1);
    assert_eq!(confirmed_ws7[0].id, a.id);

    let warehouse_orders = app
        .orders
        .list_orders(OrderFilter {
            kind: Some(OrderKind::Warehouse),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(warehouse_orders.is_empty());
}

#[tokio::test]
async fn get_by_number_round_trips() {
    let app = test_app();
    let order = customer_order(&app, 7, vec![part(1, 5)]).await;

    let fetched = app.orders.get_by_number(&order.order_number).await.unwrap();
    assert_eq!(fetched.id, order.id);

    let err = app.orders.get_by_number("CO-MISSING1").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
