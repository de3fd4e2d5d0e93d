//! Payout persistence and the serialized balance arithmetic.
//!
//! The balance check and the request insert share one transaction holding
//! a per-owner advisory lock (`pg_advisory_xact_lock`), so two concurrent
//! withdrawals from the same owner serialize and the second one sees the
//! first one's reservation. Plain `READ COMMITTED` snapshots would let
//! both pass a stale balance.

use crate::store::{PgStore, storage_err};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Postgres, Transaction};
use stagepass_core::store::{PayoutCreation, PayoutStore};
use stagepass_core::types::{
    Currency, Money, OwnerId, PayoutId, PayoutRequest, PayoutStatus,
};
use stagepass_core::{Error, Result};
use uuid::Uuid;

type PayoutRow = (
    Uuid,
    Uuid,
    i64,
    String,
    String,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

const PAYOUT_COLUMNS: &str =
    "id, owner_id, amount, currency, status, reference, created_at, resolved_at";

fn payout_from_row(row: PayoutRow) -> Result<PayoutRequest> {
    let (id, owner_id, amount, currency, status, reference, created_at, resolved_at) = row;
    Ok(PayoutRequest {
        id: PayoutId::from_uuid(id),
        owner_id: OwnerId::from_uuid(owner_id),
        amount: Money::from_minor(
            u64::try_from(amount).map_err(|_| Error::storage("negative payout amount"))?,
        ),
        currency: currency.parse::<Currency>().map_err(Error::storage)?,
        status: status.parse::<PayoutStatus>().map_err(Error::storage)?,
        reference,
        created_at,
        resolved_at,
    })
}

/// Paid revenue minus reserved payouts, computed on the given connection so
/// callers can run it inside a lock-holding transaction.
async fn balance_on(conn: &mut PgConnection, owner_id: OwnerId) -> Result<Money> {
    let (revenue,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(o.total_amount), 0)::BIGINT
         FROM orders o
         JOIN events e ON e.id = o.event_id
         WHERE e.owner_id = $1 AND o.status = 'paid'",
    )
    .bind(owner_id.as_uuid())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| storage_err("failed to sum revenue", &e))?;

    let (reserved,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0)::BIGINT
         FROM payout_requests
         WHERE owner_id = $1 AND status IN ('pending', 'approved')",
    )
    .bind(owner_id.as_uuid())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| storage_err("failed to sum reserved payouts", &e))?;

    let revenue =
        u64::try_from(revenue).map_err(|_| Error::storage("negative revenue sum"))?;
    let reserved =
        u64::try_from(reserved).map_err(|_| Error::storage("negative reservation sum"))?;
    Ok(Money::from_minor(revenue.saturating_sub(reserved)))
}

async fn lock_owner(tx: &mut Transaction<'_, Postgres>, owner_id: OwnerId) -> Result<()> {
    // Transaction-scoped advisory lock keyed by the owner id; released at
    // commit or rollback.
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::TEXT, 0))")
        .bind(owner_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| storage_err("failed to take owner lock", &e))?;
    Ok(())
}

#[async_trait]
impl PayoutStore for PgStore {
    async fn available_balance(&self, owner_id: OwnerId) -> Result<Money> {
        let mut conn = self
            .pool()
            .acquire()
            .await
            .map_err(|e| storage_err("failed to acquire connection", &e))?;
        balance_on(&mut conn, owner_id).await
    }

    async fn create_if_covered(&self, request: &PayoutRequest) -> Result<PayoutCreation> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| storage_err("failed to begin payout transaction", &e))?;

        lock_owner(&mut tx, request.owner_id).await?;
        let available = balance_on(&mut tx, request.owner_id).await?;
        if available < request.amount {
            tx.rollback()
                .await
                .map_err(|e| storage_err("failed to roll back payout transaction", &e))?;
            return Ok(PayoutCreation::InsufficientBalance { available });
        }

        sqlx::query(
            "INSERT INTO payout_requests (id, owner_id, amount, currency, status, reference,
                                          created_at, resolved_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(request.id.as_uuid())
        .bind(request.owner_id.as_uuid())
        .bind(
            i64::try_from(request.amount.minor())
                .map_err(|_| Error::validation("amount exceeds storage range"))?,
        )
        .bind(request.currency.as_str())
        .bind(request.status.as_str())
        .bind(&request.reference)
        .bind(request.created_at)
        .bind(request.resolved_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| storage_err("failed to insert payout request", &e))?;

        tx.commit()
            .await
            .map_err(|e| storage_err("failed to commit payout request", &e))?;
        Ok(PayoutCreation::Created(request.clone()))
    }

    async fn get(&self, id: PayoutId) -> Result<Option<PayoutRequest>> {
        let row: Option<PayoutRow> = sqlx::query_as(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payout_requests WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| storage_err("failed to load payout request", &e))?;
        row.map(payout_from_row).transpose()
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<PayoutRequest>> {
        let row: Option<PayoutRow> = sqlx::query_as(&format!(
            "SELECT {PAYOUT_COLUMNS} FROM payout_requests WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| storage_err("failed to load payout by reference", &e))?;
        row.map(payout_from_row).transpose()
    }

    async fn transition(
        &self,
        id: PayoutId,
        from: PayoutStatus,
        to: PayoutStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE payout_requests
             SET status = $3,
                 resolved_at = CASE WHEN $3 = 'pending' THEN NULL ELSE NOW() END
             WHERE id = $1 AND status = $2",
        )
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| storage_err("failed to transition payout", &e))?;
        Ok(result.rows_affected() == 1)
    }
}
