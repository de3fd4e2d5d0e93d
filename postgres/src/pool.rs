//! Connection pool construction.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use stagepass_core::{Error, Result};
use std::time::Duration;

/// Pool sizing and timeout settings.
#[derive(Clone, Debug)]
pub struct PoolSettings {
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of idle connections
    pub min_connections: u32,
    /// Seconds to wait when acquiring a connection
    pub connect_timeout: u64,
    /// Seconds an idle connection may linger before being closed
    pub idle_timeout: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            connect_timeout: 30,
            idle_timeout: 600,
        }
    }
}

/// Connect a pool to the database at `url`.
///
/// # Errors
///
/// Returns [`Error::Storage`] if the pool cannot be established.
pub async fn connect(url: &str, settings: &PoolSettings) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.connect_timeout))
        .idle_timeout(Duration::from_secs(settings.idle_timeout))
        .connect(url)
        .await
        .map_err(|err| Error::storage(format!("failed to connect to database: {err}")))
}
