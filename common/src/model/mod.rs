//! Domain models for the balance ledger

pub mod account;
pub mod transaction;

pub use account::AccountBalance;
pub use transaction::{TransactionRecord, TransactionRequest, TransactionStatus, TransactionType};
