//! End-to-end pipeline tests over the HTTP surface.
//!
//! Run with: `cargo test --test pipeline_test`

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::http::StatusCode;
use common::{
    admin_headers, charge_success_body, post_webhook, seed_catalog, sign, test_app,
};
use serde_json::{json, Value};
use stagepass_core::store::TicketStore;
use stagepass_core::types::{OrderId, OrderStatus, OwnerId};
use uuid::Uuid;

#[tokio::test]
async fn happy_path_checkout_to_tickets() {
    let app = test_app();
    let (event, ticket_type) = seed_catalog(&app.store, OwnerId::new(), 5000, 10).await;

    // Checkout: quantity 2 at 5000 NGN per seat.
    let response = app
        .server
        .post("/api/checkout")
        .json(&json!({
            "event_id": event.id.as_uuid(),
            "ticket_type_id": ticket_type.id.as_uuid(),
            "quantity": 2,
            "buyer_email": "ada@example.com",
            "buyer_name": "Ada Obi",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["total_amount"], 10_000);
    assert_eq!(body["currency"], "NGN");
    let order_id = OrderId::from_uuid(Uuid::parse_str(body["order_id"].as_str().unwrap()).unwrap());
    let reference = body["reference"].as_str().unwrap().to_string();
    assert!(body["redirect_url"].as_str().unwrap().contains(&reference));

    // The order is pending and no inventory is consumed yet.
    let order = app.store.order_snapshot(order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(app.store.sold_count(ticket_type.id), (10, 0));

    // The gateway reports the charge; the order becomes paid and tickets
    // are issued.
    let webhook = charge_success_body(&order);
    let signature = sign(&webhook);
    let response = post_webhook(&app.server, &webhook, Some(&signature)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let order = app.store.order_snapshot(order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.gateway_reference.as_deref(), Some("88231"));

    let tickets = app.store.for_order(order_id).await.unwrap();
    assert_eq!(tickets.len(), 2);
    assert_ne!(tickets[0].code, tickets[1].code);
    assert_eq!(app.store.sold_count(ticket_type.id), (10, 2));
    assert_eq!(app.mailer.count_of("tickets_issued"), 1);
}

#[tokio::test]
async fn webhook_redelivery_is_idempotent() {
    let app = test_app();
    let (event, ticket_type) = seed_catalog(&app.store, OwnerId::new(), 5000, 10).await;
    let _ = event;

    let response = app
        .server
        .post("/api/checkout")
        .json(&json!({
            "event_id": ticket_type.event_id.as_uuid(),
            "ticket_type_id": ticket_type.id.as_uuid(),
            "quantity": 2,
            "buyer_email": "ada@example.com",
            "buyer_name": "Ada Obi",
        }))
        .await;
    let body: Value = response.json();
    let order_id = OrderId::from_uuid(Uuid::parse_str(body["order_id"].as_str().unwrap()).unwrap());
    let order = app.store.order_snapshot(order_id).unwrap();

    let webhook = charge_success_body(&order);
    let signature = sign(&webhook);
    for _ in 0..5 {
        let response = post_webhook(&app.server, &webhook, Some(&signature)).await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    // Exactly one ticket set, one inventory decrement, one email.
    let tickets = app.store.for_order(order_id).await.unwrap();
    assert_eq!(tickets.len(), 2);
    assert_eq!(app.store.sold_count(ticket_type.id), (10, 2));
    assert_eq!(app.mailer.count_of("tickets_issued"), 1);
    assert_eq!(
        app.store.order_snapshot(order_id).unwrap().status,
        OrderStatus::Paid
    );
}

#[tokio::test]
async fn checkout_validation_failures_are_400() {
    let app = test_app();
    let (event, ticket_type) = seed_catalog(&app.store, OwnerId::new(), 5000, 10).await;

    // Zero quantity.
    let response = app
        .server
        .post("/api/checkout")
        .json(&json!({
            "event_id": event.id.as_uuid(),
            "ticket_type_id": ticket_type.id.as_uuid(),
            "quantity": 0,
            "buyer_email": "ada@example.com",
            "buyer_name": "Ada Obi",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Sold out at quote time.
    let response = app
        .server
        .post("/api/checkout")
        .json(&json!({
            "event_id": event.id.as_uuid(),
            "ticket_type_id": ticket_type.id.as_uuid(),
            "quantity": 11,
            "buyer_email": "ada@example.com",
            "buyer_name": "Ada Obi",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INSUFFICIENT_INVENTORY");

    // Bad email.
    let response = app
        .server
        .post("/api/checkout")
        .json(&json!({
            "event_id": event.id.as_uuid(),
            "ticket_type_id": ticket_type.id.as_uuid(),
            "quantity": 1,
            "buyer_email": "not-an-email",
            "buyer_name": "Ada Obi",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Nothing was created.
    assert_eq!(app.gateway.checkout_calls().len(), 0);
}

#[tokio::test]
async fn reminder_sends_exactly_once() {
    let app = test_app();
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
    let order_id = body["order_id"].as_str().unwrap().to_string();

    // Without the admin token the trigger is rejected.
    let response = app
        .server
        .post(&format!("/api/orders/{order_id}/remind"))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // First trigger sends, second is a no-op.
    let (name, value) = admin_headers();
    let response = app
        .server
        .post(&format!("/api/orders/{order_id}/remind"))
        .add_header(name.clone(), value.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["sent"], true);

    let response = app
        .server
        .post(&format!("/api/orders/{order_id}/remind"))
        .add_header(name, value)
        .await;
    let body: Value = response.json();
    assert_eq!(body["sent"], false);

    assert_eq!(app.mailer.count_of("payment_reminder"), 1);
}
