//! Ledger service implementation

use std::sync::Arc;

use common::error::Result;
use common::model::{AccountBalance, TransactionRecord, TransactionRequest};
use common::store::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore};
use tracing::{error, info};

use crate::balance::BalanceManager;
use crate::config::{LedgerConfig, StoreBackend};
use crate::processor::{TransactionOutcome, TransactionProcessor};
use crate::transaction_log::TransactionLog;

/// Ledger service wiring the core components over one store handle
pub struct LedgerService {
    /// Store shared by the balance manager and the transaction log
    store: Arc<dyn LedgerStore>,
    balances: BalanceManager,
    log: TransactionLog,
    processor: TransactionProcessor,
}

impl LedgerService {
    /// Create a new ledger service backed by an in-memory store
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryLedgerStore::new()))
    }

    /// Create a ledger service over an existing store
    pub fn with_store(store: Arc<dyn LedgerStore>) -> Self {
        let balances = BalanceManager::new(store.clone());
        let log = TransactionLog::new(store.clone());
        let processor = TransactionProcessor::new(balances.clone(), log.clone());

        Self {
            store,
            balances,
            log,
            processor,
        }
    }

    /// Create a ledger service with a configuration
    pub async fn with_config(config: &LedgerConfig) -> Result<Self> {
        let store: Arc<dyn LedgerStore> = match &config.store {
            StoreBackend::InMemory => {
                info!("Using in-memory ledger store");
                Arc::new(InMemoryLedgerStore::new())
            }
            StoreBackend::Postgres(url) => Arc::new(
                PostgresLedgerStore::connect(url, config.db_pool_size, config.store_timeout).await?,
            ),
        };

        Ok(Self::with_store(store))
    }

    /// Process a transaction request
    pub async fn process_transaction(&self, request: &TransactionRequest) -> Result<TransactionOutcome> {
        let outcome = self.processor.process(request).await;

        if let Err(e) = &outcome {
            if e.is_store_fault() {
                error!("Store fault while processing transaction {}: {}", request.id, e);
            }
        }

        outcome
    }

    /// Get the balance of an account (zero if unknown)
    pub async fn get_balance(&self, account_id: &str) -> Result<AccountBalance> {
        let balance = self.balances.get_balance(account_id).await?;
        Ok(AccountBalance::new(account_id, balance))
    }

    /// Get the recorded transactions of an account
    pub async fn list_transactions(&self, account_id: &str) -> Result<Vec<TransactionRecord>> {
        self.log.list(account_id).await
    }

    /// Get the balances of all known accounts
    pub async fn list_balances(&self) -> Result<Vec<AccountBalance>> {
        self.balances.list_balances().await
    }

    /// Probe the store
    pub async fn check_store(&self) -> Result<()> {
        self.store.ping().await
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
