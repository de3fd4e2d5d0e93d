//! Checkout initiation.

use crate::error::AppError;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use stagepass_core::orders::NewOrder;
use stagepass_core::types::{Buyer, Currency, EventId, TicketTypeId};
use uuid::Uuid;

/// Request to start a checkout.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    /// Event to buy tickets for
    pub event_id: Uuid,
    /// Ticket type within the event
    pub ticket_type_id: Uuid,
    /// Number of seats
    pub quantity: u32,
    /// Buyer email, receives the tickets
    pub buyer_email: String,
    /// Buyer display name
    pub buyer_name: String,
}

/// Response after creating a pending order.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Created order id
    pub order_id: Uuid,
    /// Payment reference round-tripping through the gateway
    pub reference: String,
    /// Hosted-checkout URL to redirect the buyer to
    pub redirect_url: String,
    /// Quoted total in minor units
    pub total_amount: u64,
    /// Quote currency
    pub currency: Currency,
}

/// Create a pending order and a hosted-checkout session for it.
///
/// Responds `400` on invalid quantity/contact details and on
/// sold-out-at-quote-time; the order is created before the gateway call,
/// so a gateway failure leaves a pending order that simply never
/// transitions.
///
/// # Errors
///
/// See [`AppError`] mapping of the domain taxonomy.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), AppError> {
    let checkout = state
        .orders
        .create(NewOrder {
            event_id: EventId::from_uuid(request.event_id),
            ticket_type_id: TicketTypeId::from_uuid(request.ticket_type_id),
            quantity: request.quantity,
            buyer: Buyer { email: request.buyer_email, name: request.buyer_name },
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_id: *checkout.order.id.as_uuid(),
            reference: checkout.order.payment_reference,
            redirect_url: checkout.redirect_url,
            total_amount: checkout.order.total_amount.minor(),
            currency: checkout.order.currency,
        }),
    ))
}
