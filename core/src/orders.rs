//! Order Manager: checkout creation and idempotent payment confirmation.
//!
//! An order stores the total quoted at checkout time; the price is not
//! re-read at confirmation, so the buyer always pays what they saw.
//! Inventory is *not* reserved here — reservation is deferred to ticket
//! issuance, which means a pending order that never receives a webhook
//! never consumes inventory.

use crate::error::{Error, Result};
use crate::gateway::{self, GatewayClient};
use crate::notify::{Dispatcher, Notice};
use crate::store::{CatalogStore, OrderStore, PaymentConfirmation};
use crate::types::{Buyer, EffectKind, EventId, Order, OrderId, OrderStatus, TicketTypeId};
use chrono::Utc;
use std::sync::Arc;

/// Input for creating an order.
#[derive(Clone, Debug)]
pub struct NewOrder {
    /// Event being purchased for
    pub event_id: EventId,
    /// Ticket type being purchased
    pub ticket_type_id: TicketTypeId,
    /// Seats requested; must be at least 1
    pub quantity: u32,
    /// Buyer contact
    pub buyer: Buyer,
}

/// A created checkout: the pending order plus where to send the buyer.
#[derive(Clone, Debug)]
pub struct Checkout {
    /// The pending order
    pub order: Order,
    /// Hosted-checkout URL from the gateway
    pub redirect_url: String,
}

/// Creates pending orders and transitions them to paid.
///
/// `confirm_paid` is the unit of idempotency for everything downstream of a
/// payment: duplicate webhook deliveries collapse to no-ops here.
pub struct OrderManager {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn GatewayClient>,
    dispatcher: Dispatcher,
}

impl OrderManager {
    /// Wire up the manager.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        gateway: Arc<dyn GatewayClient>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self { catalog, orders, gateway, dispatcher }
    }

    /// Create a pending order against a quoted price and open a
    /// hosted-checkout session for it.
    ///
    /// The availability check here is advisory (sold-out-at-quote-time
    /// rejection); the authoritative reservation happens at issuance.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] on a bad quantity or buyer contact;
    /// [`Error::NotFound`] for an unknown ticket type;
    /// [`Error::InsufficientInventory`] when the pool cannot cover the
    /// quantity at quote time; [`Error::UpstreamGateway`] if the checkout
    /// session cannot be opened.
    pub async fn create(&self, new_order: NewOrder) -> Result<Checkout> {
        if new_order.quantity == 0 {
            return Err(Error::validation("quantity must be at least 1"));
        }
        if !new_order.buyer.email.contains('@') {
            return Err(Error::validation("buyer email is invalid"));
        }
        if new_order.buyer.name.trim().is_empty() {
            return Err(Error::validation("buyer name is required"));
        }

        let ticket_type = self
            .catalog
            .ticket_type(new_order.ticket_type_id)
            .await?
            .ok_or_else(|| Error::not_found("ticket type", new_order.ticket_type_id))?;
        if ticket_type.event_id != new_order.event_id {
            return Err(Error::validation("ticket type does not belong to this event"));
        }
        if ticket_type.remaining() < new_order.quantity {
            return Err(Error::InsufficientInventory { ticket_type_id: ticket_type.id });
        }

        let total_amount = ticket_type
            .unit_price
            .checked_mul(new_order.quantity)
            .ok_or_else(|| Error::validation("order total overflows"))?;

        let id = OrderId::new();
        let order = Order {
            id,
            event_id: new_order.event_id,
            ticket_type_id: new_order.ticket_type_id,
            quantity: new_order.quantity,
            buyer: new_order.buyer,
            total_amount,
            currency: ticket_type.currency,
            status: OrderStatus::Pending,
            payment_reference: gateway::order_reference(id),
            gateway_reference: None,
            created_at: Utc::now(),
            paid_at: None,
        };
        self.orders.insert(&order).await?;

        let session = self.gateway.create_checkout_session(&order).await?;
        tracing::info!(
            order_id = %order.id,
            ticket_type_id = %order.ticket_type_id,
            quantity = order.quantity,
            total = %order.total_amount,
            "checkout created"
        );

        Ok(Checkout { order, redirect_url: session.redirect_url })
    }

    /// Idempotently mark an order paid.
    ///
    /// Only `pending → paid` mutates; a paid order is returned unchanged,
    /// which is how replayed webhook deliveries are absorbed.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown order; [`Error::Storage`] on
    /// store failure.
    pub async fn confirm_paid(
        &self,
        order_id: OrderId,
        gateway_reference: &str,
    ) -> Result<PaymentConfirmation> {
        let confirmation = self.orders.confirm_paid(order_id, gateway_reference).await?;
        match &confirmation {
            PaymentConfirmation::Confirmed(order) => {
                tracing::info!(order_id = %order.id, gateway_reference, "order paid");
            }
            PaymentConfirmation::AlreadyPaid(order) => {
                tracing::debug!(order_id = %order.id, "duplicate payment confirmation ignored");
            }
        }
        Ok(confirmation)
    }

    /// Fetch an order.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if it does not exist.
    pub async fn order(&self, id: OrderId) -> Result<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("order", id))
    }

    /// Find an order by its payment reference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on store failure.
    pub async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>> {
        self.orders.find_by_reference(reference).await
    }

    /// Send the abandoned-cart payment reminder for a pending order, at
    /// most once per order.
    ///
    /// The send-once guarantee comes from recording the `ReminderSent`
    /// effect in the same step that dispatches the email: whichever caller
    /// records the marker sends; everyone else no-ops. Returns whether this
    /// call sent the reminder.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown order; [`Error::Storage`] on
    /// store failure.
    pub async fn send_payment_reminder(&self, order_id: OrderId) -> Result<bool> {
        let order = self.order(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Ok(false);
        }
        if !self
            .orders
            .try_record_effect(order_id, EffectKind::ReminderSent)
            .await?
        {
            tracing::debug!(order_id = %order_id, "reminder already sent");
            return Ok(false);
        }
        self.dispatcher
            .dispatch(Notice::PaymentReminder { order })
            .await;
        Ok(true)
    }
}
