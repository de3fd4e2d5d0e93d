//! Router configuration.

use crate::handlers::{checkout, health, orders, payouts, webhooks};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Checkout initiation
        .route("/checkout", post(checkout::create_checkout))
        // Gateway webhooks (signature-verified, idempotent)
        .route("/webhooks/gateway", post(webhooks::gateway_webhook))
        // Abandoned-cart reminder (admin)
        .route("/orders/:id/remind", post(orders::send_reminder))
        // Organizer payouts
        .route("/payouts/balance", get(payouts::get_balance))
        .route("/payouts", post(payouts::request_payout))
        .route("/payouts/:id/resolve", post(payouts::resolve_payout));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
