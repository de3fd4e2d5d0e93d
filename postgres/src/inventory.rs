//! The inventory ledger: atomic custody of the `sold` counter.
//!
//! Both mutations are single conditional `UPDATE` statements; the row
//! either moves within its bounds or does not move at all. `rows_affected`
//! is the arbitration — there is no read-then-write anywhere.

use crate::store::{PgStore, storage_err};
use async_trait::async_trait;
use stagepass_core::store::InventoryLedger;
use stagepass_core::types::TicketTypeId;
use stagepass_core::{Error, Result};

#[async_trait]
impl InventoryLedger for PgStore {
    async fn reserve(&self, ticket_type_id: TicketTypeId, count: u32) -> Result<()> {
        let count = i32::try_from(count)
            .map_err(|_| Error::validation("reservation count exceeds storage range"))?;
        let result = sqlx::query(
            "UPDATE ticket_types
             SET sold = sold + $2
             WHERE id = $1 AND sold + $2 <= quantity",
        )
        .bind(ticket_type_id.as_uuid())
        .bind(count)
        .execute(self.pool())
        .await
        .map_err(|e| storage_err("failed to reserve inventory", &e))?;

        if result.rows_affected() == 1 {
            Ok(())
        } else {
            Err(Error::InsufficientInventory { ticket_type_id })
        }
    }

    async fn release(&self, ticket_type_id: TicketTypeId, count: u32) -> Result<()> {
        let count = i32::try_from(count)
            .map_err(|_| Error::validation("release count exceeds storage range"))?;
        let result = sqlx::query(
            "UPDATE ticket_types
             SET sold = sold - $2
             WHERE id = $1 AND sold >= $2",
        )
        .bind(ticket_type_id.as_uuid())
        .bind(count)
        .execute(self.pool())
        .await
        .map_err(|e| storage_err("failed to release inventory", &e))?;

        if result.rows_affected() == 0 {
            // Releasing more than was ever reserved is a bug upstream; keep
            // the counter in bounds and make the anomaly visible.
            tracing::error!(
                ticket_type_id = %ticket_type_id,
                count,
                "inventory release skipped: would drive sold below zero"
            );
        }
        Ok(())
    }

    async fn availability(&self, ticket_type_id: TicketTypeId) -> Result<(u32, u32)> {
        let row: Option<(i32, i32)> =
            sqlx::query_as("SELECT quantity, sold FROM ticket_types WHERE id = $1")
                .bind(ticket_type_id.as_uuid())
                .fetch_optional(self.pool())
                .await
                .map_err(|e| storage_err("failed to read availability", &e))?;
        let (quantity, sold) =
            row.ok_or_else(|| Error::not_found("ticket type", ticket_type_id))?;
        Ok((
            u32::try_from(quantity).map_err(|_| Error::storage("negative quantity"))?,
            u32::try_from(sold).map_err(|_| Error::storage("negative sold"))?,
        ))
    }
}
