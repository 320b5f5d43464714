//! Transaction log
//!
//! Owns every write to `transactions:{accountId}:{transactionId}` entries. The
//! entry doubles as the idempotency guard: it is claimed with an atomic
//! insert-if-absent before any balance effect, so a transaction id is applied
//! at most once per account however often it is retried.

use std::sync::Arc;

use common::error::{Error, Result};
use common::model::{TransactionRecord, TransactionStatus};
use common::store::{keys, LedgerStore};
use tracing::debug;

/// Result of claiming a transaction id
#[derive(Debug, Clone, PartialEq)]
pub enum RecordResult {
    /// The record was written; the caller owns the transaction
    Recorded,
    /// An entry already existed and was left untouched
    AlreadyExists(TransactionRecord),
}

/// Append-only transaction history stored in the ledger store
#[derive(Clone)]
pub struct TransactionLog {
    store: Arc<dyn LedgerStore>,
}

impl TransactionLog {
    /// Create a transaction log over a store handle
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Write the record unless an entry for (account, id) already exists
    pub async fn record_if_absent(&self, record: &TransactionRecord) -> Result<RecordResult> {
        let key = keys::transaction(&record.account_id, &record.id);
        let value = serde_json::to_string(record)?;

        if self.store.insert_if_absent(&key, &value).await? {
            debug!("Recorded transaction {} for account {}", record.id, record.account_id);
            return Ok(RecordResult::Recorded);
        }

        // Entries are never removed, so a lost insert always finds one here
        let existing = self
            .get(&record.account_id, &record.id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Transaction entry {} vanished", key)))?;

        Ok(RecordResult::AlreadyExists(existing))
    }

    /// Store the final status of a record claimed with `record_if_absent`.
    ///
    /// Only the caller that got `Recorded` may finalize, so this overwrite
    /// never races with another writer.
    pub async fn finalize(&self, record: &TransactionRecord, status: TransactionStatus) -> Result<TransactionRecord> {
        let finalized = record.with_status(status);
        let key = keys::transaction(&finalized.account_id, &finalized.id);

        self.store.set(&key, &serde_json::to_string(&finalized)?).await?;
        debug!("Finalized transaction {} as {:?}", finalized.id, status);

        Ok(finalized)
    }

    /// Give up a claim taken with `record_if_absent` whose balance update
    /// provably did not happen, so the same id can be retried.
    ///
    /// Only the still-pending entry written by that claim is removed.
    pub async fn release(&self, record: &TransactionRecord) -> Result<bool> {
        let key = keys::transaction(&record.account_id, &record.id);
        let released = self.store.delete_if_equals(&key, &serde_json::to_string(record)?).await?;

        if released {
            debug!("Released claim on transaction {} for account {}", record.id, record.account_id);
        }
        Ok(released)
    }

    /// Look up a single transaction
    pub async fn get(&self, account_id: &str, transaction_id: &str) -> Result<Option<TransactionRecord>> {
        match self.store.get(&keys::transaction(account_id, transaction_id)).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    /// All recorded transactions of an account.
    ///
    /// Ordered by transaction id, not by time; callers needing chronology
    /// sort on `timestamp`.
    pub async fn list(&self, account_id: &str) -> Result<Vec<TransactionRecord>> {
        let entries = self.store.scan_prefix(&keys::transactions_of(account_id)).await?;

        entries
            .iter()
            .map(|(_, value)| serde_json::from_str(value).map_err(Error::from))
            .collect()
    }
}
