//! Ledger service: balance mutation, transaction log and request processing

pub mod balance;
pub mod config;
pub mod processor;
pub mod service;
pub mod transaction_log;

pub use balance::{BalanceManager, Sufficiency, WithdrawalResult};
pub use config::{LedgerConfig, StoreBackend};
pub use processor::{TransactionOutcome, TransactionProcessor};
pub use service::LedgerService;
pub use transaction_log::{RecordResult, TransactionLog};
