//! Ticket Issuer: exactly-once issuance against a paid order.
//!
//! Issuance is where inventory is actually reserved (deferred policy). The
//! sequence uses only the ledger's two primitives plus the ticket store's
//! uniqueness arbitration:
//!
//! 1. fast path — tickets already exist: return them unchanged;
//! 2. `reserve` the order's quantity; a sold-out rejection records a durable
//!    `fulfillment_failed` marker instead of silently dropping a paid order;
//! 3. insert the ticket batch; if a concurrent duplicate issuance won the
//!    `(order, seat_index)` race, `release` the reservation and return the
//!    winner's tickets.
//!
//! Redemption codes are drawn from a 32-character unambiguous alphabet, 12
//! characters per code, grouped for readability. The code space (32^12)
//! makes collisions negligible at any realistic ticket volume; the store's
//! unique constraint on `code` is the backstop.

use crate::error::{Error, Result};
use crate::notify::{Dispatcher, Notice};
use crate::store::{InventoryLedger, OrderStore, TicketInsertion, TicketStore};
use crate::types::{EffectKind, Order, OrderId, OrderStatus, Ticket, TicketId, ValidationStatus};
use rand::Rng;
use std::sync::Arc;

/// Alphabet for redemption codes: uppercase letters and digits minus the
/// ambiguous I, O, 0, 1.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Characters per redemption code, before grouping dashes.
pub const CODE_LENGTH: usize = 12;

/// Generate one redemption code, grouped as `XXXX-XXXX-XXXX`.
pub fn generate_code<R: Rng>(rng: &mut R) -> String {
    let mut code = String::with_capacity(CODE_LENGTH + 2);
    for position in 0..CODE_LENGTH {
        if position > 0 && position % 4 == 0 {
            code.push('-');
        }
        let index = rng.gen_range(0..CODE_ALPHABET.len());
        code.push(CODE_ALPHABET[index] as char);
    }
    code
}

/// Issues tickets exactly once per paid order.
pub struct TicketIssuer {
    orders: Arc<dyn OrderStore>,
    tickets: Arc<dyn TicketStore>,
    inventory: Arc<dyn InventoryLedger>,
    dispatcher: Dispatcher,
}

impl TicketIssuer {
    /// Wire up the issuer.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        tickets: Arc<dyn TicketStore>,
        inventory: Arc<dyn InventoryLedger>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self { orders, tickets, inventory, dispatcher }
    }

    /// Issue the order's tickets, idempotently at order granularity.
    ///
    /// Repeated calls — sequential or concurrent — converge on one ticket
    /// set and one inventory decrement. The buyer notification fires only
    /// from the call that actually created the tickets.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown order; [`Error::OrderNotPaid`] if
    /// the order is not paid; [`Error::InsufficientInventory`] when the pool
    /// sold out between payment and issuance (the order is durably marked
    /// `fulfillment_failed` for manual reconciliation); [`Error::Storage`]
    /// on store failure.
    pub async fn issue(&self, order_id: OrderId) -> Result<Vec<Ticket>> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| Error::not_found("order", order_id))?;
        if order.status != OrderStatus::Paid {
            return Err(Error::OrderNotPaid { order_id });
        }

        let existing = self.tickets.for_order(order_id).await?;
        if !existing.is_empty() {
            tracing::debug!(order_id = %order_id, "tickets already issued");
            return Ok(existing);
        }

        match self.inventory.reserve(order.ticket_type_id, order.quantity).await {
            Ok(()) => {}
            Err(err @ Error::InsufficientInventory { .. }) => {
                self.record_fulfillment_failure(&order).await?;
                return Err(err);
            }
            Err(err) => return Err(err),
        }

        let batch = Self::build_batch(&order);
        match self.tickets.insert_for_order(&order, batch).await? {
            TicketInsertion::Inserted(tickets) => {
                tracing::info!(
                    order_id = %order_id,
                    count = tickets.len(),
                    "tickets issued"
                );
                self.dispatcher
                    .dispatch(Notice::TicketsIssued { order, tickets: tickets.clone() })
                    .await;
                Ok(tickets)
            }
            TicketInsertion::AlreadyIssued(tickets) => {
                // Lost the duplicate-delivery race after reserving; hand the
                // seats back so the winner's reservation is the only one.
                self.inventory
                    .release(order.ticket_type_id, order.quantity)
                    .await?;
                tracing::debug!(order_id = %order_id, "concurrent issuance won; reservation released");
                Ok(tickets)
            }
        }
    }

    fn build_batch(order: &Order) -> Vec<Ticket> {
        let mut rng = rand::thread_rng();
        (0..order.quantity)
            .map(|seat_index| Ticket {
                id: TicketId::new(),
                order_id: order.id,
                ticket_type_id: order.ticket_type_id,
                seat_index,
                code: generate_code(&mut rng),
                validation_status: ValidationStatus::Valid,
            })
            .collect()
    }

    /// A paid order that cannot be fulfilled must never be dropped: record
    /// the marker durably (once) and alert operations.
    async fn record_fulfillment_failure(&self, order: &Order) -> Result<()> {
        let first = self
            .orders
            .try_record_effect(order.id, EffectKind::FulfillmentFailed)
            .await?;
        if first {
            tracing::error!(
                order_id = %order.id,
                ticket_type_id = %order.ticket_type_id,
                quantity = order.quantity,
                "paid order cannot be fulfilled: inventory sold out; manual reconciliation required"
            );
            self.dispatcher
                .dispatch(Notice::FulfillmentFailed { order: order.clone() })
                .await;
        }
        Ok(())
    }
}
