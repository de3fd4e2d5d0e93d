//! Catalog reads and writes.

use crate::store::{PgStore, storage_err};
use async_trait::async_trait;
use stagepass_core::store::CatalogStore;
use stagepass_core::types::{Currency, Event, EventId, Money, OwnerId, TicketType, TicketTypeId};
use stagepass_core::{Error, Result};
use uuid::Uuid;

type TicketTypeRow = (Uuid, Uuid, String, i64, String, i32, i32);

pub(crate) fn ticket_type_from_row(row: TicketTypeRow) -> Result<TicketType> {
    let (id, event_id, name, unit_price, currency, quantity, sold) = row;
    Ok(TicketType {
        id: TicketTypeId::from_uuid(id),
        event_id: EventId::from_uuid(event_id),
        name,
        unit_price: Money::from_minor(
            u64::try_from(unit_price)
                .map_err(|_| Error::storage("negative unit price in ticket_types"))?,
        ),
        currency: currency
            .parse::<Currency>()
            .map_err(Error::storage)?,
        quantity: u32::try_from(quantity)
            .map_err(|_| Error::storage("negative quantity in ticket_types"))?,
        sold: u32::try_from(sold).map_err(|_| Error::storage("negative sold in ticket_types"))?,
    })
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn create_event(&self, event: &Event) -> Result<()> {
        sqlx::query("INSERT INTO events (id, owner_id, title) VALUES ($1, $2, $3)")
            .bind(event.id.as_uuid())
            .bind(event.owner_id.as_uuid())
            .bind(&event.title)
            .execute(self.pool())
            .await
            .map_err(|e| storage_err("failed to insert event", &e))?;
        Ok(())
    }

    async fn create_ticket_type(&self, ticket_type: &TicketType) -> Result<()> {
        sqlx::query(
            "INSERT INTO ticket_types (id, event_id, name, unit_price, currency, quantity, sold)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(ticket_type.id.as_uuid())
        .bind(ticket_type.event_id.as_uuid())
        .bind(&ticket_type.name)
        .bind(
            i64::try_from(ticket_type.unit_price.minor())
                .map_err(|_| Error::storage("unit price exceeds storage range"))?,
        )
        .bind(ticket_type.currency.as_str())
        .bind(
            i32::try_from(ticket_type.quantity)
                .map_err(|_| Error::storage("quantity exceeds storage range"))?,
        )
        .bind(i32::try_from(ticket_type.sold).map_err(|_| Error::storage("sold exceeds storage range"))?)
        .execute(self.pool())
        .await
        .map_err(|e| storage_err("failed to insert ticket type", &e))?;
        Ok(())
    }

    async fn ticket_type(&self, id: TicketTypeId) -> Result<Option<TicketType>> {
        let row: Option<TicketTypeRow> = sqlx::query_as(
            "SELECT id, event_id, name, unit_price, currency, quantity, sold
             FROM ticket_types WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| storage_err("failed to load ticket type", &e))?;
        row.map(ticket_type_from_row).transpose()
    }

    async fn event(&self, id: EventId) -> Result<Option<Event>> {
        let row: Option<(Uuid, Uuid, String)> =
            sqlx::query_as("SELECT id, owner_id, title FROM events WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(self.pool())
                .await
                .map_err(|e| storage_err("failed to load event", &e))?;
        Ok(row.map(|(event_id, owner_id, title)| Event {
            id: EventId::from_uuid(event_id),
            owner_id: OwnerId::from_uuid(owner_id),
            title,
        }))
    }
}
