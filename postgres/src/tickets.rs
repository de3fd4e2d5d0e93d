//! Ticket persistence with exactly-once arbitration.

use crate::store::{PgStore, storage_err};
use async_trait::async_trait;
use stagepass_core::store::{TicketInsertion, TicketStore};
use stagepass_core::types::{Order, OrderId, Ticket, TicketId, TicketTypeId, ValidationStatus};
use stagepass_core::{Error, Result};
use uuid::Uuid;

type TicketRow = (Uuid, Uuid, Uuid, i32, String, String);

fn ticket_from_row(row: TicketRow) -> Result<Ticket> {
    let (id, order_id, ticket_type_id, seat_index, code, validation_status) = row;
    Ok(Ticket {
        id: TicketId::from_uuid(id),
        order_id: OrderId::from_uuid(order_id),
        ticket_type_id: TicketTypeId::from_uuid(ticket_type_id),
        seat_index: u32::try_from(seat_index)
            .map_err(|_| Error::storage("negative seat index in tickets"))?,
        code,
        validation_status: validation_status
            .parse::<ValidationStatus>()
            .map_err(Error::storage)?,
    })
}

#[async_trait]
impl TicketStore for PgStore {
    async fn insert_for_order(
        &self,
        order: &Order,
        tickets: Vec<Ticket>,
    ) -> Result<TicketInsertion> {
        // One transaction per batch: either this caller materializes the
        // order's tickets or a concurrent issuance already did. The
        // (order_id, seat_index) constraint decides; first writer wins
        // wholesale because both sides insert the same seat sequence.
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| storage_err("failed to begin issuance transaction", &e))?;

        let mut inserted = 0_u64;
        for ticket in &tickets {
            let result = sqlx::query(
                "INSERT INTO tickets (id, order_id, ticket_type_id, seat_index, code, validation_status)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (order_id, seat_index) DO NOTHING",
            )
            .bind(ticket.id.as_uuid())
            .bind(ticket.order_id.as_uuid())
            .bind(ticket.ticket_type_id.as_uuid())
            .bind(
                i32::try_from(ticket.seat_index)
                    .map_err(|_| Error::validation("seat index exceeds storage range"))?,
            )
            .bind(&ticket.code)
            .bind(ticket.validation_status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_err("failed to insert ticket", &e))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| storage_err("failed to commit issuance", &e))?;

        let all = self.for_order(order.id).await?;
        if inserted == 0 {
            Ok(TicketInsertion::AlreadyIssued(all))
        } else {
            Ok(TicketInsertion::Inserted(all))
        }
    }

    async fn for_order(&self, order_id: OrderId) -> Result<Vec<Ticket>> {
        let rows: Vec<TicketRow> = sqlx::query_as(
            "SELECT id, order_id, ticket_type_id, seat_index, code, validation_status
             FROM tickets WHERE order_id = $1 ORDER BY seat_index",
        )
        .bind(order_id.as_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(|e| storage_err("failed to load tickets", &e))?;
        rows.into_iter().map(ticket_from_row).collect()
    }
}
