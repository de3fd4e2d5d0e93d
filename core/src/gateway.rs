//! Payment gateway seam.
//!
//! Abstraction over the external hosted-checkout/transfer processor. The
//! HTTP implementation lives in `stagepass-gateway`; tests use the mock in
//! `stagepass-testing`.
//!
//! Outbound calls are idempotency-keyed by locally generated references
//! that embed the order/payout id, so a retried call can never create a
//! duplicate gateway-side transaction and the id round-trips through the
//! eventual webhook.

use crate::error::Result;
use crate::types::{Order, OrderId, PayoutId, PayoutRequest};
use async_trait::async_trait;
use uuid::Uuid;

/// A hosted-checkout session created for a pending order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckoutSession {
    /// URL the buyer is redirected to in order to pay
    pub redirect_url: String,
}

/// The gateway's acknowledgement of an initiated transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Gateway-side transfer identifier
    pub gateway_reference: String,
}

/// Client for the external payment gateway.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Request a hosted-checkout session for a pending order, embedding the
    /// order id as opaque metadata.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UpstreamGateway`] if the gateway rejects the
    /// call or stays unreachable after transient-failure retries.
    async fn create_checkout_session(&self, order: &Order) -> Result<CheckoutSession>;

    /// Initiate a transfer of an approved payout to its owner.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UpstreamGateway`] if the gateway rejects the
    /// call or stays unreachable after transient-failure retries.
    async fn initiate_transfer(&self, payout: &PayoutRequest) -> Result<TransferReceipt>;
}

/// Payment reference for an order: `ord_` plus the order id without hyphens.
#[must_use]
pub fn order_reference(id: OrderId) -> String {
    format!("ord_{}", id.as_uuid().simple())
}

/// Transfer reference for a payout: `pay_` plus the payout id without
/// hyphens.
#[must_use]
pub fn payout_reference(id: PayoutId) -> String {
    format!("pay_{}", id.as_uuid().simple())
}

/// Recover the order id embedded in a payment reference.
#[must_use]
pub fn order_id_from_reference(reference: &str) -> Option<OrderId> {
    let raw = reference.strip_prefix("ord_")?;
    Uuid::parse_str(raw).ok().map(OrderId::from_uuid)
}

/// Recover the payout id embedded in a transfer reference.
#[must_use]
pub fn payout_id_from_reference(reference: &str) -> Option<PayoutId> {
    let raw = reference.strip_prefix("pay_")?;
    Uuid::parse_str(raw).ok().map(PayoutId::from_uuid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn order_reference_round_trips() {
        let id = OrderId::new();
        let reference = order_reference(id);
        assert!(reference.starts_with("ord_"));
        assert_eq!(order_id_from_reference(&reference).unwrap(), id);
    }

    #[test]
    fn payout_reference_round_trips() {
        let id = PayoutId::new();
        let reference = payout_reference(id);
        assert!(reference.starts_with("pay_"));
        assert_eq!(payout_id_from_reference(&reference).unwrap(), id);
    }

    #[test]
    fn foreign_references_do_not_parse() {
        assert!(order_id_from_reference("pay_0123").is_none());
        assert!(order_id_from_reference("ord_not-a-uuid").is_none());
        assert!(payout_id_from_reference("").is_none());
    }
}
