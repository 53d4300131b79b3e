//! SQLite persistence for owners, companies and chats.
//!
//! One [`SqliteStore`] implements every storage port of `relay-core`; schema changes live in
//! `migrations/` and are applied on connect.

mod companies;
mod directory;
mod rows;

use std::str::FromStr;

use relay_core::errors::{Error, StorageError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Storage adapter backed by a SQLite connection pool.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and apply pending migrations.
    pub async fn connect(url: &str) -> relay_core::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Config(format!("invalid DATABASE_URL {url:?}: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives as long as its connection; keep exactly one alive.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await
        }
        .map_err(|e| backend("connect", e))?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, applying migrations first.
    pub async fn from_pool(pool: SqlitePool) -> relay_core::Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Backend(format!("migrate: {e}"))))?;
        tracing::debug!(op = "storage.connect", "migrations applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Translate a sqlx failure into the port-level error vocabulary.
pub(crate) fn map_err(op: &'static str, e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::RowNotFound => StorageError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::AlreadyExists,
        other => {
            tracing::error!(op, error = %other, "storage backend failure");
            StorageError::Backend(format!("{op}: {other}"))
        }
    }
}

fn backend(op: &'static str, e: sqlx::Error) -> Error {
    Error::Storage(map_err(op, e))
}
