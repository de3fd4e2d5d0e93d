//! Production wiring: config → pool → stores → services → state.

use crate::config::Config;
use crate::state::{AppState, Stores};
use stagepass_core::gateway::GatewayClient;
use stagepass_core::notify::Mailer;
use stagepass_core::{Error, Result};
use stagepass_gateway::HttpGateway;
use stagepass_notify::{ConsoleMailer, SmtpMailer};
use stagepass_postgres::pool::PoolSettings;
use stagepass_postgres::{connect, PgStore};
use std::sync::Arc;

/// Connect the database, run migrations, and assemble the application
/// state from production implementations.
///
/// # Errors
///
/// Returns an error if the database is unreachable, migrations fail, or
/// the gateway/mailer configuration is invalid.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let pool = connect(
        &config.database.url,
        &PoolSettings {
            max_connections: config.database.max_connections,
            min_connections: config.database.min_connections,
            connect_timeout: config.database.connect_timeout,
            idle_timeout: config.database.idle_timeout,
        },
    )
    .await?;

    let store = Arc::new(PgStore::new(pool));
    store.migrate().await?;

    let gateway: Arc<dyn GatewayClient> = Arc::new(HttpGateway::new(
        config.gateway.base_url.clone(),
        config.gateway.secret_key.clone(),
    )?);

    let mailer: Arc<dyn Mailer> = match config.notifications.mode.as_str() {
        "smtp" => Arc::new(SmtpMailer::new(
            &config.notifications.smtp_host,
            config.notifications.smtp_port,
            config.notifications.smtp_username.clone(),
            config.notifications.smtp_password.clone(),
            config.notifications.from_address.clone(),
            config.notifications.ops_address.clone(),
        )?),
        "console" => Arc::new(ConsoleMailer::new(config.notifications.ops_address.clone())),
        other => {
            return Err(Error::validation(format!("unknown notification mode: {other}")));
        }
    };

    Ok(AppState::assemble(
        Stores {
            catalog: store.clone(),
            orders: store.clone(),
            tickets: store.clone(),
            inventory: store.clone(),
            payouts: store,
        },
        gateway,
        mailer,
        &config.gateway.webhook_secret,
        &config.platform.admin_token,
        config.platform.currency,
    ))
}
