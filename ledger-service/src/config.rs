//! Configuration for the ledger service

use std::env;
use std::time::Duration;

/// Which ledger store backs the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local map
    InMemory,
    /// PostgreSQL database at the given URL
    Postgres(String),
}

/// Configuration for the ledger service
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Store backend
    pub store: StoreBackend,
    /// Database connection pool size
    pub db_pool_size: u32,
    /// How long a request may wait for a store connection
    pub store_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store: env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty())
                .map(StoreBackend::Postgres)
                .unwrap_or(StoreBackend::InMemory),
            db_pool_size: env::var("DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            store_timeout: env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_secs(3)),
        }
    }
}

impl LedgerConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::default()
    }

    /// Configuration for a process-local in-memory store
    pub fn in_memory() -> Self {
        Self {
            store: StoreBackend::InMemory,
            ..Self::default()
        }
    }

    /// Create a new configuration with custom values
    pub fn new(store: StoreBackend, db_pool_size: u32, store_timeout: Duration) -> Self {
        Self {
            store,
            db_pool_size,
            store_timeout,
        }
    }
}
