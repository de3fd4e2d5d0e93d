//! Payment gateway webhook intake.
//!
//! Delivery is at-least-once and unordered, so everything downstream of
//! this handler is idempotent. The body is read as raw bytes and the
//! signature verified over exactly those bytes *before* any parsing; a
//! forged or unsigned delivery is rejected with `401` and zero side
//! effects.
//!
//! Response policy: `200` for every authentic event — including
//! duplicates, unknown event types, and references this platform does not
//! recognize — so the gateway stops redelivering. `5xx` is reserved for
//! storage faults, where redelivery plus idempotency is exactly the
//! recovery we want.

use crate::error::AppError;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use stagepass_core::store::PaymentConfirmation;
use stagepass_core::Error;
use stagepass_gateway::webhook::SIGNATURE_HEADER;
use stagepass_gateway::GatewayEvent;

/// Receive a gateway webhook.
///
/// # Errors
///
/// `401` on a missing or mismatched signature; `400` for an authentic but
/// malformed payload; `500` on storage faults.
pub async fn gateway_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(err) = state.verifier.verify(&body, signature) {
        // Potential attack signal; reject before touching the payload.
        tracing::warn!(%err, "webhook failed signature verification");
        return Err(err.into());
    }

    match GatewayEvent::parse(&body)? {
        GatewayEvent::ChargeSucceeded { data } => {
            let Some(order_id) = data.order_id() else {
                tracing::warn!(reference = %data.reference, "charge webhook without an order id");
                return Ok(StatusCode::OK);
            };
            let confirmation = match state
                .orders
                .confirm_paid(order_id, &data.gateway_reference())
                .await
            {
                Ok(confirmation) => confirmation,
                Err(Error::NotFound { .. }) => {
                    // Not an order of ours; acknowledge so the gateway
                    // stops retrying.
                    tracing::warn!(order_id = %order_id, "charge webhook for unknown order");
                    return Ok(StatusCode::OK);
                }
                Err(err) => return Err(err.into()),
            };
            if let PaymentConfirmation::Confirmed(order) = confirmation {
                match state.issuer.issue(order.id).await {
                    Ok(_) => {}
                    Err(Error::InsufficientInventory { .. }) => {
                        // Durably marked for manual reconciliation by the
                        // issuer; the payment stays confirmed.
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
        GatewayEvent::TransferSucceeded { data } => {
            state.payouts.reconcile_transfer(&data.reference, true).await?;
        }
        GatewayEvent::TransferFailed { data } => {
            state.payouts.reconcile_transfer(&data.reference, false).await?;
        }
        GatewayEvent::Unknown => {
            tracing::debug!("ignoring unrecognized gateway event type");
        }
    }
    Ok(StatusCode::OK)
}
