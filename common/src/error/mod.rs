//! Error types for the balance ledger
//!
//! This module provides a unified error handling system for every crate in
//! the ledger. Business outcomes such as a rejected withdrawal are not errors;
//! only malformed requests and store faults end up here.

use std::fmt::Display;
use thiserror::Error;

/// Ledger error type
#[derive(Debug, Error)]
pub enum Error {
    /// Request failed validation (non-positive amount, missing identifiers)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Transaction type is not one of deposit, withdraw_request, withdraw
    #[error("Invalid transaction type: {0}")]
    InvalidTransactionType(String),

    /// The ledger store could not be reached or timed out
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

impl Error {
    /// Whether the error means the effect of the request is unknown to the caller.
    ///
    /// Callers seeing such an error must retry with the same transaction id.
    pub fn is_store_fault(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::Database(_))
    }

    /// Whether a failed store write may still have taken effect.
    ///
    /// `StoreUnavailable` is raised before anything is sent, and a statement
    /// the database rejected was rolled back. Any other database failure, such
    /// as a connection lost mid-statement, leaves the outcome unknown.
    pub fn may_have_applied(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(_)) => false,
            Error::Database(_) => true,
            _ => false,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::InvalidTransactionType(msg) => Error::InvalidTransactionType(msg),
                Error::StoreUnavailable(msg) => Error::StoreUnavailable(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_interrupted_statements_may_have_applied() {
        assert!(!Error::StoreUnavailable("timed out".to_string()).may_have_applied());
        assert!(!Error::DecimalError("overflow".to_string()).may_have_applied());

        let lost = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(Error::Database(sqlx::Error::Io(lost)).may_have_applied());
        assert!(Error::Database(sqlx::Error::Io(std::io::Error::other("eof"))).is_store_fault());
    }

    #[test]
    fn context_keeps_the_variant() {
        let result: Result<()> = Err(Error::StoreUnavailable("pool closed".to_string()));
        match result.with_context(|| "Failed to credit account A") {
            Err(Error::StoreUnavailable(msg)) => assert_eq!(msg, "Failed to credit account A: pool closed"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
