//! PostgreSQL ledger store
//!
//! All entries live in a single `ledger_entries(key, value)` table. Each store
//! primitive is exactly one SQL statement, so the conditional ones are atomic
//! on the server and cost one round trip.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

use crate::decimal::{from_store_value, to_store_value, Amount};
use crate::error::{Error, Result};
use crate::store::LedgerStore;

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PostgresLedgerStore {
    /// Database connection pool
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Connect to the database and apply the embedded migrations
    pub async fn connect(database_url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<Self> {
        info!("Connecting to PostgreSQL ledger store with pool size: {}", max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(store_error)?;

        let store = Self::from_pool(pool);
        store.run_migrations().await?;

        info!("Connected to PostgreSQL ledger store");
        Ok(store)
    }

    /// Wrap an existing pool. Migrations are not applied.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the entries table if it does not exist
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Map failures to obtain a connection to `StoreUnavailable`, everything else to `Database`.
///
/// Only the former guarantee that no statement reached the server.
fn store_error(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::PoolTimedOut => Error::StoreUnavailable("timed out waiting for a connection".to_string()),
        sqlx::Error::PoolClosed => Error::StoreUnavailable("connection pool closed".to_string()),
        other => Error::Database(other),
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        debug!("Reading {} from database", key);

        sqlx::query_scalar::<_, String>("SELECT value FROM ledger_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("Writing {} to database", key);

        sqlx::query(
            "INSERT INTO ledger_entries (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value"
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO ledger_entries (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO NOTHING"
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment(&self, key: &str, delta: Amount) -> Result<Amount> {
        let value = sqlx::query_scalar::<_, String>(
            "INSERT INTO ledger_entries (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE
                SET value = (ledger_entries.value::numeric + EXCLUDED.value::numeric)::text
             RETURNING value"
        )
        .bind(key)
        .bind(to_store_value(delta))
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        from_store_value(&value)
    }

    async fn decrement_if_sufficient(&self, key: &str, amount: Amount) -> Result<Option<Amount>> {
        if amount.is_sign_negative() {
            return Err(Error::ValidationError(format!("Cannot decrement by negative amount {}", amount)));
        }

        // The row lock taken by UPDATE makes concurrent decrements re-check the
        // predicate against the committed value.
        let value = sqlx::query_scalar::<_, String>(
            "UPDATE ledger_entries
                SET value = (value::numeric - $2::numeric)::text
              WHERE key = $1 AND value::numeric >= $2::numeric
             RETURNING value"
        )
        .bind(key)
        .bind(to_store_value(amount))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        match value {
            Some(value) => from_store_value(&value).map(Some),
            // Only an absent key fails a zero decrement
            None if amount.is_zero() => Ok(Some(Amount::ZERO)),
            None => Ok(None),
        }
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ledger_entries WHERE key = $1 AND value = $2")
            .bind(key)
            .bind(expected)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        debug!("Scanning keys with prefix {}", prefix);

        let rows = sqlx::query_as::<_, (String, String)>(
            r#"SELECT key, value FROM ledger_entries
              WHERE left(key, char_length($1)) = $1
              ORDER BY key COLLATE "C""#
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
