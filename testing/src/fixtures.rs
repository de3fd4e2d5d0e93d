//! Fixture constructors for tests.

use stagepass_core::types::{
    Currency, Event, EventId, Money, OwnerId, TicketType, TicketTypeId,
};

/// An event owned by `owner_id`.
#[must_use]
pub fn event(owner_id: OwnerId) -> Event {
    Event {
        id: EventId::new(),
        owner_id,
        title: "Lagos Tech Summit".to_string(),
    }
}

/// A NGN ticket type for `event_id` with the given unit price (minor
/// units) and pool size.
#[must_use]
pub fn ticket_type(event_id: EventId, unit_price: u64, quantity: u32) -> TicketType {
    TicketType {
        id: TicketTypeId::new(),
        event_id,
        name: "General".to_string(),
        unit_price: Money::from_minor(unit_price),
        currency: Currency::Ngn,
        quantity,
        sold: 0,
    }
}
