//! In-memory store, mock gateway, and capturing mailer.

use async_trait::async_trait;
use chrono::Utc;
use stagepass_core::gateway::{CheckoutSession, GatewayClient, TransferReceipt};
use stagepass_core::notify::{Mailer, Notice};
use stagepass_core::store::{
    CatalogStore, InventoryLedger, OrderStore, PaymentConfirmation, PayoutCreation, PayoutStore,
    TicketInsertion, TicketStore,
};
use stagepass_core::types::{
    EffectKind, Event, EventId, Money, Order, OrderId, OrderStatus, OwnerId, PayoutId,
    PayoutRequest, PayoutStatus, Ticket, TicketType, TicketTypeId,
};
use stagepass_core::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    events: HashMap<EventId, Event>,
    ticket_types: HashMap<TicketTypeId, TicketType>,
    orders: HashMap<OrderId, Order>,
    tickets: HashMap<OrderId, Vec<Ticket>>,
    effects: HashSet<(OrderId, EffectKind)>,
    payouts: HashMap<PayoutId, PayoutRequest>,
}

/// In-memory implementation of every store trait.
///
/// One mutex guards the whole state and every trait method holds it for
/// its full duration, which gives each operation the same atomicity the
/// SQL statements have. Nothing is awaited while the lock is held.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another test thread panicked; the
        // state itself is still coherent for assertions.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Current `(quantity, sold)` for assertions.
    ///
    /// # Panics
    ///
    /// Panics if the ticket type does not exist.
    #[must_use]
    #[allow(clippy::panic)]
    pub fn sold_count(&self, ticket_type_id: TicketTypeId) -> (u32, u32) {
        let state = self.lock();
        let tt = state
            .ticket_types
            .get(&ticket_type_id)
            .unwrap_or_else(|| panic!("unknown ticket type {ticket_type_id}"));
        (tt.quantity, tt.sold)
    }

    /// Snapshot of an order for assertions.
    #[must_use]
    pub fn order_snapshot(&self, order_id: OrderId) -> Option<Order> {
        self.lock().orders.get(&order_id).cloned()
    }

    /// All payout requests of an owner, for invariant assertions.
    #[must_use]
    pub fn payouts_for(&self, owner_id: OwnerId) -> Vec<PayoutRequest> {
        let state = self.lock();
        let mut requests: Vec<PayoutRequest> = state
            .payouts
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        requests.sort_by_key(|p| p.created_at);
        requests
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_event(&self, event: &Event) -> Result<()> {
        self.lock().events.insert(event.id, event.clone());
        Ok(())
    }

    async fn create_ticket_type(&self, ticket_type: &TicketType) -> Result<()> {
        self.lock()
            .ticket_types
            .insert(ticket_type.id, ticket_type.clone());
        Ok(())
    }

    async fn ticket_type(&self, id: TicketTypeId) -> Result<Option<TicketType>> {
        Ok(self.lock().ticket_types.get(&id).cloned())
    }

    async fn event(&self, id: EventId) -> Result<Option<Event>> {
        Ok(self.lock().events.get(&id).cloned())
    }
}

#[async_trait]
impl InventoryLedger for MemoryStore {
    async fn reserve(&self, ticket_type_id: TicketTypeId, count: u32) -> Result<()> {
        let mut state = self.lock();
        let tt = state
            .ticket_types
            .get_mut(&ticket_type_id)
            .ok_or_else(|| Error::not_found("ticket type", ticket_type_id))?;
        // Check-and-increment under the lock, the moral equivalent of the
        // conditional UPDATE.
        match tt.sold.checked_add(count) {
            Some(next) if next <= tt.quantity => {
                tt.sold = next;
                Ok(())
            }
            _ => Err(Error::InsufficientInventory { ticket_type_id }),
        }
    }

    async fn release(&self, ticket_type_id: TicketTypeId, count: u32) -> Result<()> {
        let mut state = self.lock();
        let tt = state
            .ticket_types
            .get_mut(&ticket_type_id)
            .ok_or_else(|| Error::not_found("ticket type", ticket_type_id))?;
        if tt.sold >= count {
            tt.sold -= count;
        } else {
            tracing::error!(
                ticket_type_id = %ticket_type_id,
                count,
                "inventory release skipped: would drive sold below zero"
            );
        }
        Ok(())
    }

    async fn availability(&self, ticket_type_id: TicketTypeId) -> Result<(u32, u32)> {
        let state = self.lock();
        let tt = state
            .ticket_types
            .get(&ticket_type_id)
            .ok_or_else(|| Error::not_found("ticket type", ticket_type_id))?;
        Ok((tt.quantity, tt.sold))
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        self.lock().orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.lock().orders.get(&id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>> {
        Ok(self
            .lock()
            .orders
            .values()
            .find(|o| o.payment_reference == reference)
            .cloned())
    }

    async fn confirm_paid(
        &self,
        id: OrderId,
        gateway_reference: &str,
    ) -> Result<PaymentConfirmation> {
        let mut state = self.lock();
        let order = state
            .orders
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("order", id))?;
        if order.status == OrderStatus::Paid {
            return Ok(PaymentConfirmation::AlreadyPaid(order.clone()));
        }
        order.status = OrderStatus::Paid;
        order.gateway_reference = Some(gateway_reference.to_string());
        order.paid_at = Some(Utc::now());
        Ok(PaymentConfirmation::Confirmed(order.clone()))
    }

    async fn try_record_effect(&self, id: OrderId, kind: EffectKind) -> Result<bool> {
        Ok(self.lock().effects.insert((id, kind)))
    }

    async fn effect_recorded(&self, id: OrderId, kind: EffectKind) -> Result<bool> {
        Ok(self.lock().effects.contains(&(id, kind)))
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_for_order(
        &self,
        order: &Order,
        tickets: Vec<Ticket>,
    ) -> Result<TicketInsertion> {
        let mut state = self.lock();
        if let Some(existing) = state.tickets.get(&order.id) {
            return Ok(TicketInsertion::AlreadyIssued(existing.clone()));
        }
        state.tickets.insert(order.id, tickets.clone());
        Ok(TicketInsertion::Inserted(tickets))
    }

    async fn for_order(&self, order_id: OrderId) -> Result<Vec<Ticket>> {
        Ok(self.lock().tickets.get(&order_id).cloned().unwrap_or_default())
    }
}

fn balance_locked(state: &MemoryState, owner_id: OwnerId) -> Money {
    let revenue = state
        .orders
        .values()
        .filter(|o| o.status == OrderStatus::Paid)
        .filter(|o| {
            state
                .events
                .get(&o.event_id)
                .is_some_and(|e| e.owner_id == owner_id)
        })
        .fold(Money::ZERO, |acc, o| {
            acc.checked_add(o.total_amount).unwrap_or(acc)
        });
    let reserved = state
        .payouts
        .values()
        .filter(|p| p.owner_id == owner_id)
        .filter(|p| matches!(p.status, PayoutStatus::Pending | PayoutStatus::Approved))
        .fold(Money::ZERO, |acc, p| {
            acc.checked_add(p.amount).unwrap_or(acc)
        });
    revenue.saturating_sub(reserved)
}

#[async_trait]
impl PayoutStore for MemoryStore {
    async fn available_balance(&self, owner_id: OwnerId) -> Result<Money> {
        Ok(balance_locked(&self.lock(), owner_id))
    }

    async fn create_if_covered(&self, request: &PayoutRequest) -> Result<PayoutCreation> {
        // Balance check and insert under one lock acquisition — the
        // serialization the SQL gets from the per-owner advisory lock.
        let mut state = self.lock();
        let available = balance_locked(&state, request.owner_id);
        if available < request.amount {
            return Ok(PayoutCreation::InsufficientBalance { available });
        }
        state.payouts.insert(request.id, request.clone());
        Ok(PayoutCreation::Created(request.clone()))
    }

    async fn get(&self, id: PayoutId) -> Result<Option<PayoutRequest>> {
        Ok(self.lock().payouts.get(&id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<PayoutRequest>> {
        Ok(self
            .lock()
            .payouts
            .values()
            .find(|p| p.reference == reference)
            .cloned())
    }

    async fn transition(
        &self,
        id: PayoutId,
        from: PayoutStatus,
        to: PayoutStatus,
    ) -> Result<bool> {
        let mut state = self.lock();
        let Some(payout) = state.payouts.get_mut(&id) else {
            return Ok(false);
        };
        if payout.status != from {
            return Ok(false);
        }
        payout.status = to;
        payout.resolved_at = if to == PayoutStatus::Pending {
            None
        } else {
            Some(Utc::now())
        };
        Ok(true)
    }
}

#[derive(Default)]
struct MockGatewayState {
    checkout_calls: Vec<OrderId>,
    transfer_calls: Vec<PayoutId>,
    fail_checkout: bool,
    fail_transfers: bool,
}

/// Scriptable gateway double that records outbound calls.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockGatewayState>,
}

impl MockGateway {
    /// Create a gateway that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockGatewayState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Make checkout-session calls fail.
    pub fn fail_checkout(&self, fail: bool) {
        self.lock().fail_checkout = fail;
    }

    /// Make transfer calls fail.
    pub fn fail_transfers(&self, fail: bool) {
        self.lock().fail_transfers = fail;
    }

    /// Orders for which a checkout session was requested.
    #[must_use]
    pub fn checkout_calls(&self) -> Vec<OrderId> {
        self.lock().checkout_calls.clone()
    }

    /// Payouts for which a transfer was initiated.
    #[must_use]
    pub fn transfer_calls(&self) -> Vec<PayoutId> {
        self.lock().transfer_calls.clone()
    }
}

#[async_trait]
impl GatewayClient for MockGateway {
    async fn create_checkout_session(&self, order: &Order) -> Result<CheckoutSession> {
        let mut state = self.lock();
        if state.fail_checkout {
            return Err(Error::gateway("checkout initialization refused (mock)"));
        }
        state.checkout_calls.push(order.id);
        Ok(CheckoutSession {
            redirect_url: format!("https://checkout.gateway.test/{}", order.payment_reference),
        })
    }

    async fn initiate_transfer(&self, payout: &PayoutRequest) -> Result<TransferReceipt> {
        let mut state = self.lock();
        if state.fail_transfers {
            return Err(Error::gateway("transfer refused (mock)"));
        }
        state.transfer_calls.push(payout.id);
        Ok(TransferReceipt { gateway_reference: format!("trf_{}", payout.id.as_uuid().simple()) })
    }
}

/// Mailer double that captures every dispatched notice.
#[derive(Default)]
pub struct CapturingMailer {
    notices: Mutex<Vec<Notice>>,
    fail: Mutex<bool>,
}

impl CapturingMailer {
    /// Create an empty capturing mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deliveries fail, to prove failures never propagate.
    pub fn fail_deliveries(&self, fail: bool) {
        *self
            .fail
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = fail;
    }

    /// Everything delivered so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Count of delivered notices matching a kind label.
    #[must_use]
    pub fn count_of(&self, kind: &str) -> usize {
        self.notices().iter().filter(|n| n.kind() == kind).count()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn deliver(&self, notice: &Notice) -> Result<()> {
        if *self
            .fail
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
        {
            return Err(Error::storage("delivery refused (mock)"));
        }
        self.notices
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notice.clone());
        Ok(())
    }
}
