//! Plain-text rendering of notices.
//!
//! Buyer-facing notices go to the order's email; payout and operational
//! notices go to the configured operations address (the user directory
//! lives behind the out-of-scope auth surface, so organizer addresses are
//! not resolvable here).

use stagepass_core::notify::Notice;

/// A notice rendered to an addressed, plain-text message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedNotice {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Render a notice to its recipient, subject, and body.
#[must_use]
pub fn render(notice: &Notice, ops_address: &str) -> RenderedNotice {
    match notice {
        Notice::TicketsIssued { order, tickets } => {
            let mut body = format!(
                "Hi {},\n\nYour payment of {} {} was confirmed and your {} ticket(s) are ready.\n\nRedemption codes:\n",
                order.buyer.name,
                order.currency,
                order.total_amount,
                tickets.len(),
            );
            for ticket in tickets {
                body.push_str("  - ");
                body.push_str(&ticket.code);
                body.push('\n');
            }
            body.push_str("\nPresent a code at the entrance to redeem your seat.\n");
            RenderedNotice {
                to: order.buyer.email.clone(),
                subject: "Your tickets are ready".to_string(),
                body,
            }
        }
        Notice::PaymentReminder { order } => RenderedNotice {
            to: order.buyer.email.clone(),
            subject: "Complete your ticket purchase".to_string(),
            body: format!(
                "Hi {},\n\nYou started a ticket purchase ({} {}) that hasn't been paid yet.\nYour seats are not held until payment completes.\n\nReference: {}\n",
                order.buyer.name, order.currency, order.total_amount, order.payment_reference,
            ),
        },
        Notice::FulfillmentFailed { order } => RenderedNotice {
            to: ops_address.to_string(),
            subject: format!("Fulfillment failed for order {}", order.id),
            body: format!(
                "Order {} is paid ({} {}) but the ticket pool sold out before issuance.\nBuyer: {} <{}>\nQuantity: {}\n\nThis order needs manual reconciliation.\n",
                order.id,
                order.currency,
                order.total_amount,
                order.buyer.name,
                order.buyer.email,
                order.quantity,
            ),
        },
        Notice::PayoutApproved { payout } => RenderedNotice {
            to: ops_address.to_string(),
            subject: format!("Payout {} approved", payout.id),
            body: format!(
                "Payout {} for owner {} was approved and the transfer of {} {} was accepted by the gateway.\nReference: {}\n",
                payout.id, payout.owner_id, payout.currency, payout.amount, payout.reference,
            ),
        },
        Notice::PayoutRejected { payout } => RenderedNotice {
            to: ops_address.to_string(),
            subject: format!("Payout {} rejected", payout.id),
            body: format!(
                "Payout {} for owner {} ({} {}) was rejected; the reserved balance has been freed.\n",
                payout.id, payout.owner_id, payout.currency, payout.amount,
            ),
        },
        Notice::PayoutSettled { payout } => RenderedNotice {
            to: ops_address.to_string(),
            subject: format!("Payout {} settled", payout.id),
            body: format!(
                "The gateway confirmed settlement of payout {} ({} {}).\nReference: {}\n",
                payout.id, payout.currency, payout.amount, payout.reference,
            ),
        },
        Notice::PayoutReverted { payout } => RenderedNotice {
            to: ops_address.to_string(),
            subject: format!("Payout {} transfer failed", payout.id),
            body: format!(
                "The gateway reported the transfer for payout {} ({} {}) as failed.\nThe request is back in pending and needs another resolution.\n",
                payout.id, payout.currency, payout.amount,
            ),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stagepass_core::types::{
        Buyer, Currency, EventId, Money, Order, OrderId, OrderStatus, Ticket, TicketId,
        TicketTypeId, ValidationStatus,
    };

    fn order() -> Order {
        let id = OrderId::new();
        Order {
            id,
            event_id: EventId::new(),
            ticket_type_id: TicketTypeId::new(),
            quantity: 2,
            buyer: Buyer { email: "ada@example.com".to_string(), name: "Ada".to_string() },
            total_amount: Money::from_minor(10_000),
            currency: Currency::Ngn,
            status: OrderStatus::Paid,
            payment_reference: stagepass_core::gateway::order_reference(id),
            gateway_reference: None,
            created_at: Utc::now(),
            paid_at: Some(Utc::now()),
        }
    }

    #[test]
    fn tickets_issued_goes_to_the_buyer_with_all_codes() {
        let order = order();
        let tickets: Vec<Ticket> = (0..2)
            .map(|seat_index| Ticket {
                id: TicketId::new(),
                order_id: order.id,
                ticket_type_id: order.ticket_type_id,
                seat_index,
                code: format!("CODE-{seat_index}"),
                validation_status: ValidationStatus::Valid,
            })
            .collect();
        let rendered = render(
            &Notice::TicketsIssued { order: order.clone(), tickets },
            "ops@example.com",
        );
        assert_eq!(rendered.to, "ada@example.com");
        assert!(rendered.body.contains("CODE-0"));
        assert!(rendered.body.contains("CODE-1"));
    }

    #[test]
    fn fulfillment_failure_goes_to_operations() {
        let rendered = render(&Notice::FulfillmentFailed { order: order() }, "ops@example.com");
        assert_eq!(rendered.to, "ops@example.com");
        assert!(rendered.body.contains("manual reconciliation"));
    }
}
