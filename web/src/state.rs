//! Application state shared across HTTP handlers.

use stagepass_core::gateway::GatewayClient;
use stagepass_core::notify::{Dispatcher, Mailer};
use stagepass_core::orders::OrderManager;
use stagepass_core::payouts::PayoutLedger;
use stagepass_core::store::{
    CatalogStore, InventoryLedger, OrderStore, PayoutStore, TicketStore,
};
use stagepass_core::tickets::TicketIssuer;
use stagepass_core::types::Currency;
use stagepass_gateway::WebhookVerifier;
use std::sync::Arc;

/// Shared state: the domain services plus the webhook verifier and the
/// admin token. Cloned cheaply (all `Arc`s) per request.
#[derive(Clone)]
pub struct AppState {
    /// Order Manager
    pub orders: Arc<OrderManager>,
    /// Ticket Issuer
    pub issuer: Arc<TicketIssuer>,
    /// Payout Ledger
    pub payouts: Arc<PayoutLedger>,
    /// Webhook signature verifier
    pub verifier: Arc<WebhookVerifier>,
    /// Shared admin token, compared in constant time
    pub admin_token: Arc<str>,
}

/// Store seams needed to assemble the services; one backend usually
/// implements all of them.
pub struct Stores {
    /// Catalog reads/writes
    pub catalog: Arc<dyn CatalogStore>,
    /// Order persistence
    pub orders: Arc<dyn OrderStore>,
    /// Ticket persistence
    pub tickets: Arc<dyn TicketStore>,
    /// Inventory ledger
    pub inventory: Arc<dyn InventoryLedger>,
    /// Payout persistence
    pub payouts: Arc<dyn PayoutStore>,
}

impl AppState {
    /// Assemble the services over their seams.
    ///
    /// Used by the production bootstrap (PostgreSQL stores, HTTP gateway,
    /// SMTP or console mailer) and by tests (memory stores, mocks) alike.
    #[must_use]
    pub fn assemble(
        stores: Stores,
        gateway: Arc<dyn GatewayClient>,
        mailer: Arc<dyn Mailer>,
        webhook_secret: &str,
        admin_token: &str,
        currency: Currency,
    ) -> Self {
        let dispatcher = Dispatcher::new(mailer);
        let orders = Arc::new(OrderManager::new(
            stores.catalog,
            stores.orders.clone(),
            gateway.clone(),
            dispatcher.clone(),
        ));
        let issuer = Arc::new(TicketIssuer::new(
            stores.orders,
            stores.tickets,
            stores.inventory,
            dispatcher.clone(),
        ));
        let payouts = Arc::new(PayoutLedger::new(
            stores.payouts,
            gateway,
            dispatcher,
            currency,
        ));
        Self {
            orders,
            issuer,
            payouts,
            verifier: Arc::new(WebhookVerifier::new(webhook_secret.as_bytes().to_vec())),
            admin_token: Arc::from(admin_token),
        }
    }
}
