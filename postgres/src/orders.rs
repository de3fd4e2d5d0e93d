//! Order persistence: inserts, lookups, the paid CAS, and effect markers.

use crate::store::{PgStore, storage_err};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stagepass_core::store::{OrderStore, PaymentConfirmation};
use stagepass_core::types::{
    Buyer, Currency, EffectKind, EventId, Order, OrderId, OrderStatus, TicketTypeId,
};
use stagepass_core::{Error, Result};
use uuid::Uuid;

type OrderRow = (
    Uuid,
    Uuid,
    Uuid,
    i32,
    String,
    String,
    i64,
    String,
    String,
    String,
    Option<String>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

const ORDER_COLUMNS: &str = "id, event_id, ticket_type_id, quantity, buyer_email, buyer_name, \
     total_amount, currency, status, payment_reference, gateway_reference, created_at, paid_at";

pub(crate) fn order_from_row(row: OrderRow) -> Result<Order> {
    let (
        id,
        event_id,
        ticket_type_id,
        quantity,
        buyer_email,
        buyer_name,
        total_amount,
        currency,
        status,
        payment_reference,
        gateway_reference,
        created_at,
        paid_at,
    ) = row;
    Ok(Order {
        id: OrderId::from_uuid(id),
        event_id: EventId::from_uuid(event_id),
        ticket_type_id: TicketTypeId::from_uuid(ticket_type_id),
        quantity: u32::try_from(quantity)
            .map_err(|_| Error::storage("negative quantity in orders"))?,
        buyer: Buyer { email: buyer_email, name: buyer_name },
        total_amount: stagepass_core::types::Money::from_minor(
            u64::try_from(total_amount)
                .map_err(|_| Error::storage("negative total in orders"))?,
        ),
        currency: currency.parse::<Currency>().map_err(Error::storage)?,
        status: status.parse::<OrderStatus>().map_err(Error::storage)?,
        payment_reference,
        gateway_reference,
        created_at,
        paid_at,
    })
}

impl PgStore {
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| storage_err("failed to load order", &e))?;
        row.map(order_from_row).transpose()
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders (id, event_id, ticket_type_id, quantity, buyer_email, buyer_name,
                                 total_amount, currency, status, payment_reference,
                                 gateway_reference, created_at, paid_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(order.id.as_uuid())
        .bind(order.event_id.as_uuid())
        .bind(order.ticket_type_id.as_uuid())
        .bind(
            i32::try_from(order.quantity)
                .map_err(|_| Error::validation("quantity exceeds storage range"))?,
        )
        .bind(&order.buyer.email)
        .bind(&order.buyer.name)
        .bind(
            i64::try_from(order.total_amount.minor())
                .map_err(|_| Error::validation("total exceeds storage range"))?,
        )
        .bind(order.currency.as_str())
        .bind(order.status.as_str())
        .bind(&order.payment_reference)
        .bind(order.gateway_reference.as_deref())
        .bind(order.created_at)
        .bind(order.paid_at)
        .execute(self.pool())
        .await
        .map_err(|e| storage_err("failed to insert order", &e))?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.fetch_order(id).await
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_reference = $1"
        ))
        .bind(reference)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| storage_err("failed to load order by reference", &e))?;
        row.map(order_from_row).transpose()
    }

    async fn confirm_paid(
        &self,
        id: OrderId,
        gateway_reference: &str,
    ) -> Result<PaymentConfirmation> {
        let result = sqlx::query(
            "UPDATE orders
             SET status = 'paid', gateway_reference = $2, paid_at = NOW()
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id.as_uuid())
        .bind(gateway_reference)
        .execute(self.pool())
        .await
        .map_err(|e| storage_err("failed to confirm payment", &e))?;

        let order = self
            .fetch_order(id)
            .await?
            .ok_or_else(|| Error::not_found("order", id))?;

        if result.rows_affected() == 1 {
            Ok(PaymentConfirmation::Confirmed(order))
        } else if order.status == OrderStatus::Paid {
            Ok(PaymentConfirmation::AlreadyPaid(order))
        } else {
            // Only pending → paid exists, so a missed CAS on a non-paid row
            // means the store is in a state this machine cannot produce.
            Err(Error::storage(format!("order {id} in unexpected state after CAS")))
        }
    }

    async fn try_record_effect(&self, id: OrderId, kind: EffectKind) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO order_effects (order_id, kind) VALUES ($1, $2)
             ON CONFLICT (order_id, kind) DO NOTHING",
        )
        .bind(id.as_uuid())
        .bind(kind.as_str())
        .execute(self.pool())
        .await
        .map_err(|e| storage_err("failed to record effect", &e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn effect_recorded(&self, id: OrderId, kind: EffectKind) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM order_effects WHERE order_id = $1 AND kind = $2)",
        )
        .bind(id.as_uuid())
        .bind(kind.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| storage_err("failed to check effect", &e))?;
        Ok(row.0)
    }
}
