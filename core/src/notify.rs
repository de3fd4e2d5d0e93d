//! Notification dispatch, strictly after commit.
//!
//! Notices are fired only once the owning state change has durably
//! committed. Delivery failure is logged and swallowed: it is never
//! retried synchronously and never rolls back a financial mutation.

use crate::error::Result;
use crate::types::{Order, PayoutRequest, Ticket};
use async_trait::async_trait;
use std::sync::Arc;

/// A user-visible side effect of a committed state change.
#[derive(Clone, Debug)]
pub enum Notice {
    /// Tickets were issued for a paid order; delivered to the buyer.
    TicketsIssued {
        /// The paid order
        order: Order,
        /// The issued tickets with their redemption codes
        tickets: Vec<Ticket>,
    },
    /// Abandoned-cart reminder for a pending order; delivered to the buyer
    /// at most once per order.
    PaymentReminder {
        /// The pending order
        order: Order,
    },
    /// A paid order could not be fulfilled (sold out at issuance); delivered
    /// to operations for manual reconciliation.
    FulfillmentFailed {
        /// The stranded order
        order: Order,
    },
    /// A payout was approved and its transfer accepted by the gateway.
    PayoutApproved {
        /// The approved request
        payout: PayoutRequest,
    },
    /// A payout was rejected by an administrator.
    PayoutRejected {
        /// The rejected request
        payout: PayoutRequest,
    },
    /// The gateway confirmed the transfer settled.
    PayoutSettled {
        /// The settled request
        payout: PayoutRequest,
    },
    /// The gateway reported the transfer failed; the request returned to
    /// pending.
    PayoutReverted {
        /// The reverted request
        payout: PayoutRequest,
    },
}

impl Notice {
    /// Stable kind label for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TicketsIssued { .. } => "tickets_issued",
            Self::PaymentReminder { .. } => "payment_reminder",
            Self::FulfillmentFailed { .. } => "fulfillment_failed",
            Self::PayoutApproved { .. } => "payout_approved",
            Self::PayoutRejected { .. } => "payout_rejected",
            Self::PayoutSettled { .. } => "payout_settled",
            Self::PayoutReverted { .. } => "payout_reverted",
        }
    }
}

/// Delivery channel for notices.
///
/// Implementations: console rendering for development and SMTP for
/// production (`stagepass-notify`), plus a capturing mailer for tests
/// (`stagepass-testing`).
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one notice.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery failed; the dispatcher logs and
    /// swallows it.
    async fn deliver(&self, notice: &Notice) -> Result<()>;
}

/// Fire-and-forget dispatcher over a [`Mailer`].
#[derive(Clone)]
pub struct Dispatcher {
    mailer: Arc<dyn Mailer>,
}

impl Dispatcher {
    /// Create a dispatcher over the given delivery channel.
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Deliver a notice, logging failure instead of propagating it.
    ///
    /// Callers invoke this only after the owning transaction committed, so
    /// there is nothing left to roll back on failure.
    pub async fn dispatch(&self, notice: Notice) {
        let kind = notice.kind();
        if let Err(error) = self.mailer.deliver(&notice).await {
            tracing::error!(kind, %error, "notification delivery failed");
        } else {
            tracing::debug!(kind, "notification delivered");
        }
    }
}
