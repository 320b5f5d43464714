//! Common types and utilities for the balance ledger
//!
//! This library contains shared types, utilities, and abstractions used across
//! the ledger crates. It provides a unified approach to error handling, the
//! key-value store contract, and domain models.

pub mod error;
pub mod model;
pub mod decimal;
pub mod store;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, IntoError};
pub use decimal::*;

// Re-export store types
pub use store::{LedgerStore, InMemoryLedgerStore, PostgresLedgerStore};

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
