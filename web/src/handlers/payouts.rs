//! Organizer payouts: balance, withdrawal requests, admin resolution.

use crate::auth::{AdminCaller, OwnerIdentity};
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use stagepass_core::types::{Currency, Money, PayoutId, PayoutStatus};
use uuid::Uuid;

/// Current withdrawable balance.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Available amount in minor units
    pub available: u64,
    /// Settlement currency
    pub currency: Currency,
}

/// Request to withdraw an amount.
#[derive(Debug, Deserialize)]
pub struct PayoutRequestBody {
    /// Amount in minor units
    pub amount: u64,
}

/// A payout request as returned by the API.
#[derive(Debug, Serialize)]
pub struct PayoutResponse {
    /// Request id
    pub payout_id: Uuid,
    /// Transfer reference
    pub reference: String,
    /// Current status
    pub status: PayoutStatus,
    /// Amount in minor units
    pub amount: u64,
    /// Settlement currency
    pub currency: Currency,
}

/// Admin decision on a pending payout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Approve and initiate the gateway transfer
    Approve,
    /// Reject, freeing the reserved balance
    Reject,
}

/// Body of the resolve call.
#[derive(Debug, Deserialize)]
pub struct ResolveBody {
    /// The decision
    pub decision: Decision,
}

/// Current available balance for the calling organizer.
///
/// # Errors
///
/// `401` without an owner identity; `500` on storage faults.
pub async fn get_balance(
    owner: OwnerIdentity,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, AppError> {
    let available = state.payouts.available_balance(owner.0).await?;
    Ok(Json(BalanceResponse {
        available: available.minor(),
        currency: state.payouts.currency(),
    }))
}

/// Reserve a withdrawal against the calling organizer's balance.
///
/// # Errors
///
/// `400` with `INSUFFICIENT_BALANCE` when the serialized check fails.
pub async fn request_payout(
    owner: OwnerIdentity,
    State(state): State<AppState>,
    Json(body): Json<PayoutRequestBody>,
) -> Result<(StatusCode, Json<PayoutResponse>), AppError> {
    let payout = state
        .payouts
        .request(owner.0, Money::from_minor(body.amount))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PayoutResponse {
            payout_id: *payout.id.as_uuid(),
            reference: payout.reference,
            status: payout.status,
            amount: payout.amount.minor(),
            currency: payout.currency,
        }),
    ))
}

/// Resolve a pending payout (admin only). Approval initiates the gateway
/// transfer; a gateway rejection reverts the request and surfaces `502`.
///
/// # Errors
///
/// `401` without a valid admin token; `400` if the request is not
/// pending; `502` when the gateway refuses the transfer.
pub async fn resolve_payout(
    _admin: AdminCaller,
    Path(payout_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<ResolveBody>,
) -> Result<Json<PayoutResponse>, AppError> {
    let id = PayoutId::from_uuid(payout_id);
    let payout = match body.decision {
        Decision::Approve => state.payouts.approve(id).await?,
        Decision::Reject => state.payouts.reject(id).await?,
    };
    Ok(Json(PayoutResponse {
        payout_id: *payout.id.as_uuid(),
        reference: payout.reference,
        status: payout.status,
        amount: payout.amount.minor(),
        currency: payout.currency,
    }))
}
