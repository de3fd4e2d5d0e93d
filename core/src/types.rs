//! Domain types for the Stagepass ticketing pipeline.
//!
//! Value objects, entities, and state types shared by every component:
//! identifier newtypes, cents-based money, and the order/ticket/payout
//! entities with their status machines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket type (a priced inventory pool of an event)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketTypeId(Uuid);

impl TicketTypeId {
    /// Creates a new random `TicketTypeId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketTypeId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketTypeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an order (one checkout attempt)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket (one purchased seat)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(Uuid);

impl TicketId {
    /// Creates a new random `TicketId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a payout request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutId(Uuid);

impl PayoutId {
    /// Creates a new random `PayoutId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `PayoutId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PayoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an event organizer (the payout beneficiary)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates a new random `OwnerId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OwnerId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (minor units to avoid floating point errors)
// ============================================================================

/// Represents money in minor units (kobo, cents) to avoid floating-point
/// arithmetic errors.
///
/// All arithmetic is checked; quoting a total that would overflow is a
/// validation failure, not a wrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.0
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiply a unit price by a quantity, `None` on overflow
    #[must_use]
    pub const fn checked_mul(&self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(minor) => Some(Self(minor)),
            None => None,
        }
    }

    /// Add two amounts, `None` on overflow
    #[must_use]
    pub const fn checked_add(&self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(minor) => Some(Self(minor)),
            None => None,
        }
    }

    /// Subtract, clamping at zero
    #[must_use]
    pub const fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Settlement currency (ISO 4217 code).
///
/// One currency per organizer balance; the closed set matches the markets the
/// payment gateway settles in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Nigerian naira
    Ngn,
    /// Ghanaian cedi
    Ghs,
    /// South African rand
    Zar,
    /// United States dollar
    Usd,
}

impl Currency {
    /// ISO 4217 code for wire formats and storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ngn => "NGN",
            Self::Ghs => "GHS",
            Self::Zar => "ZAR",
            Self::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NGN" => Ok(Self::Ngn),
            "GHS" => Ok(Self::Ghs),
            "ZAR" => Ok(Self::Zar),
            "USD" => Ok(Self::Usd),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

// ============================================================================
// Status machines
// ============================================================================

/// Order lifecycle.
///
/// The only transition is `Pending → Paid`; a paid order never regresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, awaiting a payment confirmation
    Pending,
    /// Payment confirmed by the gateway
    Paid,
}

impl OrderStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Ticket validation state; transitions once, irreversibly, at entry scanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// Not yet redeemed
    Valid,
    /// Redeemed at the venue
    Used,
}

impl ValidationStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Used => "used",
        }
    }
}

impl FromStr for ValidationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(Self::Valid),
            "used" => Ok(Self::Used),
            other => Err(format!("unknown validation status: {other}")),
        }
    }
}

/// Payout request lifecycle.
///
/// `Pending → Approved` commits only once the gateway accepted the transfer;
/// a gateway rejection reverts to `Pending`. `Pending → Rejected` frees the
/// reserved balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Reserved against the owner's balance, awaiting resolution
    Pending,
    /// Approved and transfer accepted by the gateway
    Approved,
    /// Rejected by an administrator
    Rejected,
}

impl PayoutStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for PayoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown payout status: {other}")),
        }
    }
}

/// One-way side-effect markers recorded against an order.
///
/// Each `(order, kind)` pair can be recorded at most once; uniqueness is
/// enforced by the store, which is what makes reminder sending and
/// fulfillment-failure escalation idempotent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Abandoned-cart payment reminder was dispatched
    ReminderSent,
    /// Paid order could not be fulfilled (sold out at issuance); needs manual
    /// reconciliation
    FulfillmentFailed,
}

impl EffectKind {
    /// Storage representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReminderSent => "reminder_sent",
            Self::FulfillmentFailed => "fulfillment_failed",
        }
    }
}

impl FromStr for EffectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reminder_sent" => Ok(Self::ReminderSent),
            "fulfillment_failed" => Ok(Self::FulfillmentFailed),
            other => Err(format!("unknown effect kind: {other}")),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// An event in the catalog; the owner is the payout beneficiary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Organizer who receives this event's revenue
    pub owner_id: OwnerId,
    /// Display title
    pub title: String,
}

/// A named, priced inventory pool for an event (e.g. "VIP", "General").
///
/// Invariant: `0 <= sold <= quantity` at all times, even under concurrent
/// purchases. `sold` is mutated only through the inventory ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    /// Ticket type identifier
    pub id: TicketTypeId,
    /// Owning event
    pub event_id: EventId,
    /// Display name
    pub name: String,
    /// Price per seat, in minor units
    pub unit_price: Money,
    /// Settlement currency
    pub currency: Currency,
    /// Total seats in the pool
    pub quantity: u32,
    /// Seats sold so far
    pub sold: u32,
}

impl TicketType {
    /// Seats not yet sold
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.quantity.saturating_sub(self.sold)
    }
}

/// Contact details of the buyer on an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    /// Delivery address for tickets and reminders
    pub email: String,
    /// Display name
    pub name: String,
}

/// One buyer's checkout attempt for a quantity of a single ticket type.
///
/// Orders are never deleted; they are the audit trail of the money path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier
    pub id: OrderId,
    /// Event the purchase belongs to
    pub event_id: EventId,
    /// Ticket type being purchased
    pub ticket_type_id: TicketTypeId,
    /// Seats requested
    pub quantity: u32,
    /// Buyer contact
    pub buyer: Buyer,
    /// Quoted total, frozen at checkout time
    pub total_amount: Money,
    /// Quote currency
    pub currency: Currency,
    /// Lifecycle state
    pub status: OrderStatus,
    /// Locally generated reference embedding the order id; doubles as the
    /// gateway idempotency key and round-trips through the webhook
    pub payment_reference: String,
    /// Gateway-side transaction reference, recorded at confirmation
    pub gateway_reference: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Payment confirmation time
    pub paid_at: Option<DateTime<Utc>>,
}

/// One purchased seat with its redemption code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier
    pub id: TicketId,
    /// Order this seat was purchased under
    pub order_id: OrderId,
    /// Ticket type of the seat
    pub ticket_type_id: TicketTypeId,
    /// Position within the order (0-based); `(order_id, seat_index)` is unique
    pub seat_index: u32,
    /// Globally unique, unguessable redemption code
    pub code: String,
    /// Redemption state
    pub validation_status: ValidationStatus,
}

/// An organizer's request to withdraw accumulated revenue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRequest {
    /// Payout identifier
    pub id: PayoutId,
    /// Requesting organizer
    pub owner_id: OwnerId,
    /// Amount to withdraw, in minor units
    pub amount: Money,
    /// Settlement currency
    pub currency: Currency,
    /// Lifecycle state
    pub status: PayoutStatus,
    /// Locally generated reference embedding the payout id; the gateway
    /// transfer idempotency key
    pub reference: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Resolution time (approve or reject); cleared again if a failed
    /// transfer reverts the request
    pub resolved_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn money_checked_mul_quotes_totals() {
        let unit = Money::from_minor(5000);
        assert_eq!(unit.checked_mul(2), Some(Money::from_minor(10_000)));
        assert_eq!(Money::from_minor(u64::MAX).checked_mul(2), None);
    }

    #[test]
    fn money_saturating_sub_clamps_at_zero() {
        let a = Money::from_minor(100);
        let b = Money::from_minor(250);
        assert_eq!(a.saturating_sub(b), Money::ZERO);
        assert_eq!(b.saturating_sub(a), Money::from_minor(150));
    }

    #[test]
    fn money_displays_minor_units_as_decimal() {
        assert_eq!(Money::from_minor(500_000).to_string(), "5000.00");
        assert_eq!(Money::from_minor(1205).to_string(), "12.05");
    }

    #[test]
    fn currency_round_trips_through_storage_form() {
        for currency in [Currency::Ngn, Currency::Ghs, Currency::Zar, Currency::Usd] {
            assert_eq!(currency.as_str().parse::<Currency>().unwrap(), currency);
        }
        assert!("EUR".parse::<Currency>().is_err());
    }

    #[test]
    fn statuses_round_trip_through_storage_form() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("paid".parse::<OrderStatus>().unwrap(), OrderStatus::Paid);
        assert_eq!("approved".parse::<PayoutStatus>().unwrap(), PayoutStatus::Approved);
        assert_eq!(
            "fulfillment_failed".parse::<EffectKind>().unwrap(),
            EffectKind::FulfillmentFailed
        );
        assert!("refunded".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn ticket_type_remaining_never_underflows() {
        let tt = TicketType {
            id: TicketTypeId::new(),
            event_id: EventId::new(),
            name: "VIP".to_string(),
            unit_price: Money::from_minor(5000),
            currency: Currency::Ngn,
            quantity: 3,
            sold: 5,
        };
        assert_eq!(tt.remaining(), 0);
    }
}
