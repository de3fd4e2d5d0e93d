//! The shared store handle.

use sqlx::PgPool;
use stagepass_core::{Error, Result};

/// Embedded migrations, applied at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// PostgreSQL-backed implementation of every Stagepass store trait.
///
/// Cheap to clone; trait implementations live in the sibling modules.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool, for health checks and tests.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|err| Error::storage(format!("migration failed: {err}")))
    }
}

/// Map a sqlx error to the domain storage error.
pub(crate) fn storage_err(context: &str, err: &sqlx::Error) -> Error {
    Error::storage(format!("{context}: {err}"))
}
