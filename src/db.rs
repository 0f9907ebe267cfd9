//! Storage handle.
//!
//! [`Storage`] owns the connection pool to the document store. It is built
//! once at startup and shared as `Arc<Storage>`; the pool itself is opened on
//! the first [`Storage::acquire`] call. Concurrent first callers are
//! serialized by the `OnceCell`, so exactly one of them connects and probes.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::DbConfig;
use crate::error::StoreError;

pub struct Storage {
    config: DbConfig,
    pool: OnceCell<SqlitePool>,
}

impl Storage {
    pub fn new(config: &DbConfig) -> Self {
        Self {
            config: config.clone(),
            pool: OnceCell::new(),
        }
    }

    /// Per-operation time budget for readers of this store.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// Returns the shared pool, connecting and probing it on first use.
    pub async fn acquire(&self) -> Result<&SqlitePool, StoreError> {
        self.pool.get_or_try_init(|| self.connect()).await
    }

    async fn connect(&self) -> Result<SqlitePool, StoreError> {
        let db_path = &self.config.path;
        tracing::info!(path = %db_path.display(), "connecting to database");

        let connect_err = |source| StoreError::Connect {
            path: db_path.display().to_string(),
            source,
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| connect_err(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(self.timeout())
            .connect_with(options)
            .await
            .map_err(connect_err)?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(StoreError::Probe)?;

        Ok(pool)
    }

    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }
}
