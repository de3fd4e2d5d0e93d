//! Shared fixtures for the HTTP and service-level integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestResponse, TestServer};
use chrono::Utc;
use stagepass_core::gateway::order_reference;
use stagepass_core::store::{CatalogStore, OrderStore};
use stagepass_core::types::{
    Buyer, Currency, Event, Order, OrderId, OrderStatus, OwnerId, TicketType,
};
use stagepass_gateway::WebhookVerifier;
use stagepass_testing::{fixtures, CapturingMailer, MemoryStore, MockGateway};
use stagepass_web::state::Stores;
use stagepass_web::{build_router, AppState};
use std::sync::Arc;

/// Webhook secret shared between the test verifier and the router state.
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Admin token wired into the router state.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// A fully wired application over in-memory stores and mocks.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<MockGateway>,
    pub mailer: Arc<CapturingMailer>,
}

/// Build the application exactly as production does, with the memory
/// backends swapped in.
pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let gateway = Arc::new(MockGateway::new());
    let mailer = Arc::new(CapturingMailer::new());
    let state = AppState::assemble(
        Stores {
            catalog: store.clone(),
            orders: store.clone(),
            tickets: store.clone(),
            inventory: store.clone(),
            payouts: store.clone(),
        },
        gateway.clone(),
        mailer.clone(),
        WEBHOOK_SECRET,
        ADMIN_TOKEN,
        Currency::Ngn,
    );
    let server = TestServer::new(build_router(state.clone())).unwrap();
    TestApp { server, state, store, gateway, mailer }
}

/// Seed an event with one ticket type.
pub async fn seed_catalog(
    store: &MemoryStore,
    owner: OwnerId,
    unit_price: u64,
    quantity: u32,
) -> (Event, TicketType) {
    let event = fixtures::event(owner);
    let ticket_type = fixtures::ticket_type(event.id, unit_price, quantity);
    store.create_event(&event).await.unwrap();
    store.create_ticket_type(&ticket_type).await.unwrap();
    (event, ticket_type)
}

/// Insert an already-paid order directly, for tests that start after the
/// payment step.
pub async fn insert_paid_order(
    store: &MemoryStore,
    event: &Event,
    ticket_type: &TicketType,
    quantity: u32,
) -> Order {
    let id = OrderId::new();
    let order = Order {
        id,
        event_id: event.id,
        ticket_type_id: ticket_type.id,
        quantity,
        buyer: Buyer { email: "buyer@example.com".to_string(), name: "Buyer".to_string() },
        total_amount: ticket_type.unit_price.checked_mul(quantity).unwrap(),
        currency: ticket_type.currency,
        status: OrderStatus::Paid,
        payment_reference: order_reference(id),
        gateway_reference: Some("gw_test".to_string()),
        created_at: Utc::now(),
        paid_at: Some(Utc::now()),
    };
    store.insert(&order).await.unwrap();
    order
}

/// Sign a webhook body with the shared test secret.
pub fn sign(body: &str) -> String {
    WebhookVerifier::new(WEBHOOK_SECRET.as_bytes().to_vec())
        .sign(body.as_bytes())
        .unwrap()
}

/// Sign a webhook body with a different key, to forge deliveries.
pub fn sign_with_wrong_key(body: &str) -> String {
    WebhookVerifier::new(b"attacker-guessed-secret".to_vec())
        .sign(body.as_bytes())
        .unwrap()
}

/// A `charge.success` payload for an order, the shape the gateway posts.
pub fn charge_success_body(order: &Order) -> String {
    format!(
        r#"{{"event":"charge.success","data":{{"id":88231,"reference":"{}","amount":{},"currency":"{}","metadata":{{"order_id":"{}"}}}}}}"#,
        order.payment_reference,
        order.total_amount.minor(),
        order.currency,
        order.id.as_uuid(),
    )
}

/// A `transfer.failed` payload for a payout reference.
pub fn transfer_failed_body(reference: &str) -> String {
    format!(r#"{{"event":"transfer.failed","data":{{"reference":"{reference}"}}}}"#)
}

/// POST a raw webhook body with an optional signature header.
pub async fn post_webhook(
    server: &TestServer,
    body: &str,
    signature: Option<&str>,
) -> TestResponse {
    let mut request = server
        .post("/api/webhooks/gateway")
        .bytes(Bytes::from(body.to_string()))
        .content_type("application/json");
    if let Some(signature) = signature {
        request = request.add_header(
            HeaderName::from_static("x-gateway-signature"),
            HeaderValue::from_str(signature).unwrap(),
        );
    }
    request.await
}

/// Admin-token header pair for admin endpoints.
pub fn admin_headers() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-admin-token"),
        HeaderValue::from_static(ADMIN_TOKEN),
    )
}

/// Owner-identity header pair for organizer endpoints.
pub fn owner_headers(owner: OwnerId) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-owner-id"),
        HeaderValue::from_str(&owner.as_uuid().to_string()).unwrap(),
    )
}
