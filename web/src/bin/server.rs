//! Stagepass server.
//!
//! Boots the order → payment → ticket-issuance → payout pipeline:
//! connects PostgreSQL, applies migrations, wires the gateway client and
//! the mailer, and serves the HTTP surface until interrupted.

use stagepass_web::{bootstrap, build_router, Config};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stagepass=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        gateway = %config.gateway.base_url,
        notify_mode = %config.notifications.mode,
        "configuration loaded"
    );

    let state = bootstrap::build_state(&config).await?;
    tracing::info!("stores migrated, services wired");

    let router = build_router(state);
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "stagepass server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    tracing::info!("shut down cleanly");
    Ok(())
}
