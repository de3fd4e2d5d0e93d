//! Order-scoped operations: the abandoned-cart reminder.

use crate::auth::AdminCaller;
use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use stagepass_core::types::OrderId;
use uuid::Uuid;

/// Result of a reminder trigger.
#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    /// Whether this call sent the reminder (`false` if already sent or the
    /// order is no longer pending)
    pub sent: bool,
}

/// Trigger the payment reminder for a pending order.
///
/// Send-once: the `reminder_sent` marker is recorded in the same step that
/// dispatches the email, so repeated triggers — including concurrent ones —
/// deliver at most one reminder.
///
/// # Errors
///
/// `401` without a valid admin token; `404` for an unknown order.
pub async fn send_reminder(
    _admin: AdminCaller,
    Path(order_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<ReminderResponse>, AppError> {
    let sent = state
        .orders
        .send_payment_reminder(OrderId::from_uuid(order_id))
        .await?;
    Ok(Json(ReminderResponse { sent }))
}
