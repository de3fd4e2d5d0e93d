//! Store traits: the seams between domain services and persistence.
//!
//! Every invariant with write contention is expressed here as a single
//! atomic operation — a conditional update that either applies or reports
//! why not — so that no caller can reintroduce a read-then-write race.
//! The PostgreSQL implementations live in `stagepass-postgres`; the
//! in-memory implementations with identical observable semantics live in
//! `stagepass-testing`.

use crate::error::Result;
use crate::types::{
    EffectKind, Event, EventId, Money, Order, OrderId, OwnerId, PayoutId, PayoutRequest,
    PayoutStatus, Ticket, TicketType, TicketTypeId,
};
use async_trait::async_trait;

/// Catalog reads and writes for events and their ticket types.
///
/// Creation exists for seeding and operations tooling; the browsing UI is an
/// external collaborator and never goes through this trait.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert an event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn create_event(&self, event: &Event) -> Result<()>;

    /// Insert a ticket type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn create_ticket_type(&self, ticket_type: &TicketType) -> Result<()>;

    /// Fetch a ticket type by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn ticket_type(&self, id: TicketTypeId) -> Result<Option<TicketType>>;

    /// Fetch an event by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn event(&self, id: EventId) -> Result<Option<Event>>;
}

/// Atomic custody of the `sold` counter per ticket type.
///
/// `sold` is mutated exclusively through this trait; no other code path may
/// write it.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Atomically take `count` seats: succeeds iff `sold + count <= quantity`
    /// held at the instant of the update. Equivalent to
    /// `UPDATE ticket_types SET sold = sold + n WHERE id = ? AND sold + n <= quantity`
    /// succeeding only if the row was actually updated.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InsufficientInventory`] if the pool cannot cover the
    /// request; [`crate::Error::Storage`] on store failure.
    async fn reserve(&self, ticket_type_id: TicketTypeId, count: u32) -> Result<()>;

    /// Compensating action: hand back `count` seats previously reserved.
    /// Clamped so `sold` never goes below zero.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn release(&self, ticket_type_id: TicketTypeId, count: u32) -> Result<()>;

    /// Advisory `(quantity, sold)` read, used for the sold-out-at-quote-time
    /// check. Never a substitute for [`reserve`](Self::reserve).
    ///
    /// # Errors
    ///
    /// [`crate::Error::NotFound`] if the ticket type does not exist;
    /// [`crate::Error::Storage`] on store failure.
    async fn availability(&self, ticket_type_id: TicketTypeId) -> Result<(u32, u32)>;
}

/// Outcome of an idempotent payment confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentConfirmation {
    /// This call performed the `pending → paid` transition.
    Confirmed(Order),
    /// The order was already paid; nothing changed. This is the seam that
    /// absorbs duplicate and replayed webhook deliveries.
    AlreadyPaid(Order),
}

impl PaymentConfirmation {
    /// The order in either outcome.
    #[must_use]
    pub const fn order(&self) -> &Order {
        match self {
            Self::Confirmed(order) | Self::AlreadyPaid(order) => order,
        }
    }
}

/// Order persistence: insert, lookup, the paid transition, and one-way
/// effect markers.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new pending order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Fetch an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Fetch an order by its payment reference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>>;

    /// Compare-and-swap `pending → paid`, recording the gateway's own
    /// transaction reference and the confirmation time. If the order is
    /// already paid the stored order is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`crate::Error::NotFound`] if the order does not exist;
    /// [`crate::Error::Storage`] on store failure.
    async fn confirm_paid(
        &self,
        id: OrderId,
        gateway_reference: &str,
    ) -> Result<PaymentConfirmation>;

    /// Record a one-way effect marker. Returns `true` iff this call recorded
    /// it; `false` means it was already present. Uniqueness of
    /// `(order, kind)` is enforced by the store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn try_record_effect(&self, id: OrderId, kind: EffectKind) -> Result<bool>;

    /// Whether an effect marker is present.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn effect_recorded(&self, id: OrderId, kind: EffectKind) -> Result<bool>;
}

/// Outcome of a ticket batch insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketInsertion {
    /// This call created the order's tickets.
    Inserted(Vec<Ticket>),
    /// Another issuance won the `(order, seat_index)` uniqueness race; the
    /// winner's tickets are returned unchanged.
    AlreadyIssued(Vec<Ticket>),
}

/// Ticket persistence.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert the order's ticket batch, arbitrated by the
    /// `(order, seat_index)` uniqueness constraint: under concurrent
    /// duplicate issuance exactly one caller inserts; the others observe
    /// [`TicketInsertion::AlreadyIssued`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn insert_for_order(&self, order: &Order, tickets: Vec<Ticket>)
        -> Result<TicketInsertion>;

    /// All tickets of an order, in seat order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn for_order(&self, order_id: OrderId) -> Result<Vec<Ticket>>;
}

/// Outcome of a balance-checked payout insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PayoutCreation {
    /// The request was inserted with the balance check holding.
    Created(PayoutRequest),
    /// The owner's balance could not cover the amount at the instant of the
    /// serialized check.
    InsufficientBalance {
        /// Balance observed inside the same transaction
        available: Money,
    },
}

/// Payout persistence and the serialized balance arithmetic.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Derived available balance: paid revenue across the owner's events
    /// minus pending and approved payout amounts. Never stored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn available_balance(&self, owner_id: OwnerId) -> Result<Money>;

    /// Compute the balance and insert the request in one serialized
    /// transaction per owner. Two racing requests can never both pass a
    /// stale balance.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn create_if_covered(&self, request: &PayoutRequest) -> Result<PayoutCreation>;

    /// Fetch a payout request by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn get(&self, id: PayoutId) -> Result<Option<PayoutRequest>>;

    /// Fetch a payout request by its transfer reference.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn find_by_reference(&self, reference: &str) -> Result<Option<PayoutRequest>>;

    /// Compare-and-swap the status. Returns `true` iff the request was in
    /// `from` and is now in `to`. `resolved_at` is set when leaving
    /// `Pending` and cleared when reverting to it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] on store failure.
    async fn transition(&self, id: PayoutId, from: PayoutStatus, to: PayoutStatus)
        -> Result<bool>;
}
