//! Webhook authentication and tolerance tests.
//!
//! Run with: `cargo test --test webhook_test`

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::http::StatusCode;
use common::{
    charge_success_body, post_webhook, seed_catalog, sign, sign_with_wrong_key, test_app,
};
use serde_json::{json, Value};
use stagepass_core::store::TicketStore;
use stagepass_core::types::{OrderId, OrderStatus, OwnerId};
use uuid::Uuid;

async fn pending_order(app: &common::TestApp) -> (stagepass_core::types::Order, OrderId) {
    let (event, ticket_type) = seed_catalog(&app.store, OwnerId::new(), 5000, 10).await;
    let response = app
        .server
        .post("/api/checkout")
        .json(&json!({
            "event_id": event.id.as_uuid(),
            "ticket_type_id": ticket_type.id.as_uuid(),
            "quantity": 1,
            "buyer_email": "ada@example.com",
            "buyer_name": "Ada Obi",
        }))
        .await;
    let body: Value = response.json();
    let order_id = OrderId::from_uuid(Uuid::parse_str(body["order_id"].as_str().unwrap()).unwrap());
    (app.store.order_snapshot(order_id).unwrap(), order_id)
}

#[tokio::test]
async fn wrong_key_signature_is_rejected_with_no_side_effects() {
    let app = test_app();
    let (order, order_id) = pending_order(&app).await;

    let webhook = charge_success_body(&order);
    let forged = sign_with_wrong_key(&webhook);
    let response = post_webhook(&app.server, &webhook, Some(&forged)).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // Zero side effects: still pending, no tickets, no notifications.
    assert_eq!(
        app.store.order_snapshot(order_id).unwrap().status,
        OrderStatus::Pending
    );
    assert!(app.store.for_order(order_id).await.unwrap().is_empty());
    assert!(app.mailer.notices().is_empty());
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let app = test_app();
    let (order, order_id) = pending_order(&app).await;

    let webhook = charge_success_body(&order);
    let response = post_webhook(&app.server, &webhook, None).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.store.order_snapshot(order_id).unwrap().status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn tampered_body_fails_verification() {
    let app = test_app();
    let (order, order_id) = pending_order(&app).await;

    let webhook = charge_success_body(&order);
    let signature = sign(&webhook);
    let tampered = webhook.replace(&order.total_amount.minor().to_string(), "1");
    let response = post_webhook(&app.server, &tampered, Some(&signature)).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.store.order_snapshot(order_id).unwrap().status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn unknown_event_types_are_acknowledged_without_effects() {
    let app = test_app();
    let (_, order_id) = pending_order(&app).await;

    let webhook = r#"{"event":"subscription.create","data":{"code":"SUB_123"}}"#;
    let signature = sign(webhook);
    let response = post_webhook(&app.server, webhook, Some(&signature)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        app.store.order_snapshot(order_id).unwrap().status,
        OrderStatus::Pending
    );
    assert!(app.mailer.notices().is_empty());
}

#[tokio::test]
async fn authentic_but_malformed_payload_is_400() {
    let app = test_app();
    let webhook = "definitely not json";
    let signature = sign(webhook);
    let response = post_webhook(&app.server, webhook, Some(&signature)).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn charge_for_an_unknown_order_is_acknowledged() {
    let app = test_app();
    let webhook = format!(
        r#"{{"event":"charge.success","data":{{"reference":"ord_{}","metadata":{{"order_id":"{}"}}}}}}"#,
        Uuid::new_v4().simple(),
        Uuid::new_v4(),
    );
    let signature = sign(&webhook);
    let response = post_webhook(&app.server, &webhook, Some(&signature)).await;
    // Acknowledge so the gateway stops redelivering a foreign reference.
    assert_eq!(response.status_code(), StatusCode::OK);
}
