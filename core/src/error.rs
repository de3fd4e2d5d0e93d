//! Error taxonomy for the ticketing pipeline.
//!
//! The taxonomy distinguishes user-correctable validation failures,
//! races-lost business rejections (sold out, overdrawn), authentication
//! failures on untrusted input, upstream gateway faults, and storage faults.
//! Duplicate webhook deliveries are *not* errors anywhere in this crate;
//! idempotent operations resolve them to no-ops.

use crate::types::{Money, OrderId, TicketTypeId};
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of the order/payment/ticketing/payout pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Caller mistake, recoverable by retrying with corrected input.
    #[error("validation failed: {reason}")]
    Validation {
        /// What was wrong with the input
        reason: String,
    },

    /// The inventory pool cannot cover the requested seats. Terminal for
    /// this attempt; not retried automatically.
    #[error("insufficient inventory for ticket type {ticket_type_id}")]
    InsufficientInventory {
        /// Pool that was sold out
        ticket_type_id: TicketTypeId,
    },

    /// The owner's available balance cannot cover the requested withdrawal.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Amount the owner asked for
        requested: Money,
        /// Balance at the instant of the check
        available: Money,
    },

    /// Ticket issuance was attempted against an order that is not paid.
    #[error("order {order_id} is not paid")]
    OrderNotPaid {
        /// The offending order
        order_id: OrderId,
    },

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. "order"
        entity: &'static str,
        /// Identifier that missed
        id: String,
    },

    /// Untrusted input failed authentication (webhook signature, admin
    /// token). Rejected before any processing; logged as a potential attack
    /// signal by the caller.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Why authentication failed
        reason: String,
    },

    /// The payment gateway rejected or never answered a call, after any
    /// transient-failure retries.
    #[error("payment gateway error: {message}")]
    UpstreamGateway {
        /// Gateway-side failure description
        message: String,
    },

    /// The persistent store failed.
    #[error("storage error: {message}")]
    Storage {
        /// Store-side failure description
        message: String,
    },
}

impl Error {
    /// Validation failure with a reason.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    /// Missing-entity failure.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    /// Authentication failure with a reason.
    #[must_use]
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication { reason: reason.into() }
    }

    /// Upstream gateway failure.
    #[must_use]
    pub fn gateway(message: impl Into<String>) -> Self {
        Self::UpstreamGateway { message: message.into() }
    }

    /// Storage failure.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_amounts_for_balance_rejections() {
        let err = Error::InsufficientBalance {
            requested: Money::from_minor(700_000),
            available: Money::from_minor(500_000),
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance: requested 7000.00, available 5000.00"
        );
    }

    #[test]
    fn not_found_names_the_entity() {
        let id = OrderId::new();
        let err = Error::not_found("order", id);
        assert_eq!(err.to_string(), format!("order {id} not found"));
    }
}
