//! Inventory race tests: the no-oversell property under concurrency.
//!
//! Run with: `cargo test --test oversell_test`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::{insert_paid_order, seed_catalog, test_app};
use stagepass_core::store::OrderStore;
use stagepass_core::types::{EffectKind, OwnerId};
use stagepass_core::Error;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn n_buyers_for_q_seats_issue_exactly_q() {
    const QUANTITY: u32 = 10;
    const BUYERS: u32 = 25;

    let app = test_app();
    let (event, ticket_type) = seed_catalog(&app.store, OwnerId::new(), 5000, QUANTITY).await;

    let mut orders = Vec::new();
    for _ in 0..BUYERS {
        orders.push(insert_paid_order(&app.store, &event, &ticket_type, 1).await);
    }

    let mut handles = Vec::new();
    for order in &orders {
        let issuer = app.state.issuer.clone();
        let order_id = order.id;
        handles.push(tokio::spawn(async move { issuer.issue(order_id).await }));
    }

    let mut issued = 0;
    let mut sold_out = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(tickets) => {
                assert_eq!(tickets.len(), 1);
                issued += 1;
            }
            Err(Error::InsufficientInventory { .. }) => sold_out += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(issued, QUANTITY);
    assert_eq!(sold_out, BUYERS - QUANTITY);
    // The pool ends exactly full: sold == quantity, never beyond.
    assert_eq!(app.store.sold_count(ticket_type.id), (QUANTITY, QUANTITY));

    // Every losing order carries the durable reconciliation marker.
    let mut markers = 0;
    for order in &orders {
        if app
            .store
            .effect_recorded(order.id, EffectKind::FulfillmentFailed)
            .await
            .unwrap()
        {
            markers += 1;
        }
    }
    assert_eq!(markers, sold_out);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_orders_race_for_the_last_seat() {
    let app = test_app();
    let (event, ticket_type) = seed_catalog(&app.store, OwnerId::new(), 5000, 1).await;

    let first = insert_paid_order(&app.store, &event, &ticket_type, 1).await;
    let second = insert_paid_order(&app.store, &event, &ticket_type, 1).await;

    let issuer_a = app.state.issuer.clone();
    let issuer_b = app.state.issuer.clone();
    let (a, b) = tokio::join!(
        tokio::spawn({
            let id = first.id;
            async move { issuer_a.issue(id).await }
        }),
        tokio::spawn({
            let id = second.id;
            async move { issuer_b.issue(id).await }
        }),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let winners = outcomes.iter().filter(|o| o.is_ok()).count();
    let losers = outcomes
        .iter()
        .filter(|o| matches!(o, Err(Error::InsufficientInventory { .. })))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(losers, 1);
    assert_eq!(app.store.sold_count(ticket_type.id), (1, 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn duplicate_issuance_of_one_order_converges() {
    let app = test_app();
    let (event, ticket_type) = seed_catalog(&app.store, OwnerId::new(), 5000, 10).await;
    let order = insert_paid_order(&app.store, &event, &ticket_type, 2).await;

    let issuer_a = app.state.issuer.clone();
    let issuer_b = app.state.issuer.clone();
    let order_id = order.id;
    let (a, b) = tokio::join!(
        tokio::spawn(async move { issuer_a.issue(order_id).await }),
        tokio::spawn(async move { issuer_b.issue(order_id).await }),
    );
    let tickets_a = a.unwrap().unwrap();
    let tickets_b = b.unwrap().unwrap();

    // Both callers see the same single ticket set, and the loser's
    // reservation was handed back: sold counts the order once.
    let codes_a: Vec<&str> = tickets_a.iter().map(|t| t.code.as_str()).collect();
    let codes_b: Vec<&str> = tickets_b.iter().map(|t| t.code.as_str()).collect();
    assert_eq!(codes_a, codes_b);
    assert_eq!(tickets_a.len(), 2);
    assert_eq!(app.store.sold_count(ticket_type.id), (10, 2));
    assert_eq!(app.mailer.count_of("tickets_issued"), 1);
}

#[tokio::test]
async fn issuing_an_unpaid_order_is_refused() {
    let app = test_app();
    let (event, ticket_type) = seed_catalog(&app.store, OwnerId::new(), 5000, 10).await;
    let mut order = insert_paid_order(&app.store, &event, &ticket_type, 1).await;
    order.status = stagepass_core::types::OrderStatus::Pending;
    order.paid_at = None;
    app.store.insert(&order).await.unwrap();

    let result = app.state.issuer.issue(order.id).await;
    assert!(matches!(result, Err(Error::OrderNotPaid { .. })));
    assert_eq!(app.store.sold_count(ticket_type.id), (10, 0));
}
