//! Ledger store contract
//!
//! The ledger keeps all of its state in an external key-value service. This
//! module defines what the core needs from that service and ships two
//! adapters: an in-memory map for tests and single-process deployments, and a
//! PostgreSQL table for shared deployments.
//!
//! Every operation whose result depends on a value another writer may change
//! concurrently is a single atomic primitive here. Callers never read a
//! balance, compute, and write it back.

use async_trait::async_trait;

use crate::decimal::Amount;
use crate::error::Result;

pub mod keys;
pub mod memory;
pub mod postgres;

pub use memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;

/// Key-value store interface used by the balance manager and transaction log
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Unconditionally overwrite a value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write `value` only if `key` is absent. Returns whether the write happened.
    async fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool>;

    /// Atomically add `delta` to the decimal stored at `key` (absent reads as zero).
    /// Returns the new value.
    async fn increment(&self, key: &str, delta: Amount) -> Result<Amount>;

    /// Atomically subtract `amount` from the decimal stored at `key` if the
    /// current value is at least `amount` (absent reads as zero).
    ///
    /// Returns the new value, or `None` without writing when funds are short.
    async fn decrement_if_sufficient(&self, key: &str, amount: Amount) -> Result<Option<Amount>>;

    /// Remove `key` only if it currently holds exactly `expected`.
    /// Returns whether the entry was removed.
    async fn delete_if_equals(&self, key: &str, expected: &str) -> Result<bool>;

    /// All entries whose key starts with `prefix`, ordered by key
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>>;

    /// Liveness probe
    async fn ping(&self) -> Result<()>;
}
