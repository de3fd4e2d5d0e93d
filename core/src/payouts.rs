//! Payout Ledger: derived balances and overdraw-proof withdrawals.
//!
//! The available balance is always computed, never stored: paid revenue
//! across the owner's events minus pending and approved payout amounts.
//! The balance check and the request insert happen in one serialized
//! transaction per owner inside the store, so two concurrent withdrawals
//! can never both pass a stale balance.
//!
//! Approval commits only once the gateway accepted the transfer; a gateway
//! rejection reverts the request to pending rather than leaving it
//! approved with no money moving.

use crate::error::{Error, Result};
use crate::gateway::{self, GatewayClient};
use crate::notify::{Dispatcher, Notice};
use crate::store::{PayoutCreation, PayoutStore};
use crate::types::{Currency, Money, OwnerId, PayoutId, PayoutRequest, PayoutStatus};
use chrono::Utc;
use std::sync::Arc;

/// Computes balances and manages the payout request lifecycle.
pub struct PayoutLedger {
    payouts: Arc<dyn PayoutStore>,
    gateway: Arc<dyn GatewayClient>,
    dispatcher: Dispatcher,
    currency: Currency,
}

impl PayoutLedger {
    /// Wire up the ledger with the platform settlement currency.
    #[must_use]
    pub fn new(
        payouts: Arc<dyn PayoutStore>,
        gateway: Arc<dyn GatewayClient>,
        dispatcher: Dispatcher,
        currency: Currency,
    ) -> Self {
        Self { payouts, gateway, dispatcher, currency }
    }

    /// The platform settlement currency.
    #[must_use]
    pub const fn currency(&self) -> Currency {
        self.currency
    }

    /// The owner's withdrawable balance right now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on store failure.
    pub async fn available_balance(&self, owner_id: OwnerId) -> Result<Money> {
        self.payouts.available_balance(owner_id).await
    }

    /// Reserve a withdrawal against the owner's balance.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a zero amount;
    /// [`Error::InsufficientBalance`] when the serialized check fails;
    /// [`Error::Storage`] on store failure.
    pub async fn request(&self, owner_id: OwnerId, amount: Money) -> Result<PayoutRequest> {
        if amount.is_zero() {
            return Err(Error::validation("payout amount must be positive"));
        }

        let id = PayoutId::new();
        let request = PayoutRequest {
            id,
            owner_id,
            amount,
            currency: self.currency,
            status: PayoutStatus::Pending,
            reference: gateway::payout_reference(id),
            created_at: Utc::now(),
            resolved_at: None,
        };
        match self.payouts.create_if_covered(&request).await? {
            PayoutCreation::Created(created) => {
                tracing::info!(
                    payout_id = %created.id,
                    owner_id = %owner_id,
                    amount = %created.amount,
                    "payout requested"
                );
                Ok(created)
            }
            PayoutCreation::InsufficientBalance { available } => {
                Err(Error::InsufficientBalance { requested: amount, available })
            }
        }
    }

    /// Approve a pending request and initiate the gateway transfer.
    ///
    /// Exactly one approver wins the `pending → approved` swap. If the
    /// gateway then rejects the transfer, the request is reverted to
    /// pending and the gateway error propagates — the request is treated as
    /// committed only after the gateway accepted the transfer. Retried
    /// approvals reuse the same transfer reference, so the gateway never
    /// books a duplicate.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown request; [`Error::Validation`]
    /// when the request is not pending; [`Error::UpstreamGateway`] if the
    /// transfer was rejected (the request is back in pending);
    /// [`Error::Storage`] on store failure.
    pub async fn approve(&self, id: PayoutId) -> Result<PayoutRequest> {
        if !self
            .payouts
            .transition(id, PayoutStatus::Pending, PayoutStatus::Approved)
            .await?
        {
            return match self.payouts.get(id).await? {
                None => Err(Error::not_found("payout request", id)),
                Some(existing) => Err(Error::validation(format!(
                    "payout request is {}, not pending",
                    existing.status.as_str()
                ))),
            };
        }

        let approved = self
            .payouts
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("payout request", id))?;

        match self.gateway.initiate_transfer(&approved).await {
            Ok(receipt) => {
                tracing::info!(
                    payout_id = %id,
                    gateway_reference = %receipt.gateway_reference,
                    amount = %approved.amount,
                    "payout approved, transfer initiated"
                );
                self.dispatcher
                    .dispatch(Notice::PayoutApproved { payout: approved.clone() })
                    .await;
                Ok(approved)
            }
            Err(err) => {
                let reverted = self
                    .payouts
                    .transition(id, PayoutStatus::Approved, PayoutStatus::Pending)
                    .await?;
                if reverted {
                    tracing::warn!(payout_id = %id, %err, "transfer rejected; payout reverted to pending");
                } else {
                    // The request left `approved` underneath us; surface
                    // loudly, an operator has to look at it.
                    tracing::error!(payout_id = %id, %err, "transfer rejected and revert failed; manual reconciliation required");
                }
                Err(err)
            }
        }
    }

    /// Reject a pending request, freeing its reserved balance.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown request; [`Error::Validation`]
    /// when the request is not pending; [`Error::Storage`] on store
    /// failure.
    pub async fn reject(&self, id: PayoutId) -> Result<PayoutRequest> {
        if !self
            .payouts
            .transition(id, PayoutStatus::Pending, PayoutStatus::Rejected)
            .await?
        {
            return match self.payouts.get(id).await? {
                None => Err(Error::not_found("payout request", id)),
                Some(existing) => Err(Error::validation(format!(
                    "payout request is {}, not pending",
                    existing.status.as_str()
                ))),
            };
        }
        let rejected = self
            .payouts
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("payout request", id))?;
        tracing::info!(payout_id = %id, "payout rejected");
        self.dispatcher
            .dispatch(Notice::PayoutRejected { payout: rejected.clone() })
            .await;
        Ok(rejected)
    }

    /// Reconcile a transfer-outcome webhook against the matching request.
    ///
    /// A failed transfer reverts the approved request to pending (the
    /// reserved balance stays reserved until an operator resolves it); a
    /// settled transfer only notifies. Unknown references are logged and
    /// acknowledged — they are not this platform's transfers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on store failure.
    pub async fn reconcile_transfer(&self, reference: &str, settled: bool) -> Result<()> {
        let Some(payout) = self.payouts.find_by_reference(reference).await? else {
            tracing::warn!(reference, "transfer webhook for unknown payout reference");
            return Ok(());
        };

        if settled {
            if payout.status == PayoutStatus::Approved {
                self.dispatcher
                    .dispatch(Notice::PayoutSettled { payout })
                    .await;
            }
            return Ok(());
        }

        if self
            .payouts
            .transition(payout.id, PayoutStatus::Approved, PayoutStatus::Pending)
            .await?
        {
            tracing::warn!(payout_id = %payout.id, "gateway transfer failed; payout reverted to pending");
            let reverted = self
                .payouts
                .get(payout.id)
                .await?
                .ok_or_else(|| Error::not_found("payout request", payout.id))?;
            self.dispatcher
                .dispatch(Notice::PayoutReverted { payout: reverted })
                .await;
        }
        Ok(())
    }

    /// Fetch a payout request.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if it does not exist.
    pub async fn get(&self, id: PayoutId) -> Result<PayoutRequest> {
        self.payouts
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("payout request", id))
    }
}
