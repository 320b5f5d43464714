//! Transaction processor
//!
//! Interprets one transaction request and drives the balance manager and the
//! transaction log. It keeps no state between requests; everything lives in
//! the store.
//!
//! Mutating requests follow the same three steps:
//! 1. claim the transaction id in the log as `pending` (dedup gate),
//! 2. apply the balance mutation atomically,
//! 3. finalize the log entry with the outcome (`applied` or `rejected`).
//!
//! If step 2 fails without touching the balance, the claim is released and
//! the id can be retried. A request that stops between steps with an unknown
//! effect leaves a `pending` entry behind, and replays of the id report that
//! state rather than guessing.

use common::decimal::precision;
use common::error::{Error, Result};
use common::model::{TransactionRecord, TransactionRequest, TransactionStatus, TransactionType};
use common::store::keys;
use common::Amount;
use tracing::{debug, error, info, warn};

use crate::balance::{BalanceManager, Sufficiency, WithdrawalResult};
use crate::transaction_log::{RecordResult, TransactionLog};

/// Outcome of processing a transaction request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Deposit or withdrawal applied; carries the resulting balance
    Applied { balance: Amount },
    /// Transaction id already seen for the account; nothing was changed
    Duplicate { status: TransactionStatus },
    /// `withdraw_request`: the balance currently covers the amount
    Sufficient,
    /// `withdraw_request`: the balance does not cover the amount
    Insufficient,
    /// Withdrawal refused for insufficient funds
    Rejected,
}

/// Stateless per-request transaction state machine
#[derive(Clone)]
pub struct TransactionProcessor {
    balances: BalanceManager,
    log: TransactionLog,
}

impl TransactionProcessor {
    /// Create a processor over a balance manager and transaction log
    pub fn new(balances: BalanceManager, log: TransactionLog) -> Self {
        Self { balances, log }
    }

    /// Process one transaction request
    pub async fn process(&self, request: &TransactionRequest) -> Result<TransactionOutcome> {
        let kind = request.transaction_type()?;
        validate(request)?;

        debug!(
            "Processing {} {} of {} on account {}",
            kind, request.id, request.amount, request.account_id
        );

        match kind {
            TransactionType::Deposit => self.deposit(request).await,
            TransactionType::WithdrawRequest => self.withdraw_request(request).await,
            TransactionType::Withdraw => self.withdraw(request).await,
        }
    }

    async fn deposit(&self, request: &TransactionRequest) -> Result<TransactionOutcome> {
        let record = TransactionRecord::pending(request, TransactionType::Deposit);
        if let Some(duplicate) = self.claim(&record).await? {
            return Ok(duplicate);
        }

        let balance = match self.balances.apply_deposit(&request.account_id, request.amount).await {
            Ok(balance) => balance,
            Err(e) => return Err(self.abandon(&record, e).await),
        };
        self.log.finalize(&record, TransactionStatus::Applied).await?;

        Ok(TransactionOutcome::Applied { balance })
    }

    async fn withdraw_request(&self, request: &TransactionRequest) -> Result<TransactionOutcome> {
        // Read-only: neither the log nor the balance is touched, and no funds are held
        match self.balances.peek_sufficiency(&request.account_id, request.amount).await? {
            Sufficiency::Sufficient => Ok(TransactionOutcome::Sufficient),
            Sufficiency::Insufficient => {
                info!(
                    "Withdraw request {} for {} on account {} not covered",
                    request.id, request.amount, request.account_id
                );
                Ok(TransactionOutcome::Insufficient)
            }
        }
    }

    async fn withdraw(&self, request: &TransactionRequest) -> Result<TransactionOutcome> {
        let record = TransactionRecord::pending(request, TransactionType::Withdraw);
        if let Some(duplicate) = self.claim(&record).await? {
            return Ok(duplicate);
        }

        let result = match self.balances.try_apply_withdrawal(&request.account_id, request.amount).await {
            Ok(result) => result,
            Err(e) => return Err(self.abandon(&record, e).await),
        };

        match result {
            WithdrawalResult::Succeeded { balance } => {
                self.log.finalize(&record, TransactionStatus::Applied).await?;
                Ok(TransactionOutcome::Applied { balance })
            }
            WithdrawalResult::InsufficientFunds => {
                self.log.finalize(&record, TransactionStatus::Rejected).await?;
                Ok(TransactionOutcome::Rejected)
            }
        }
    }

    /// Handle a failed balance update after the id was claimed.
    ///
    /// When the store provably did not apply the update, the claim is released
    /// so a retry with the same id runs again. Otherwise the entry stays
    /// `pending`: applying the retry could double-count.
    async fn abandon(&self, record: &TransactionRecord, err: Error) -> Error {
        if err.may_have_applied() {
            error!(
                "Outcome of transaction {} on account {} unknown, left pending: {}",
                record.id, record.account_id, err
            );
            return err;
        }

        match self.log.release(record).await {
            Ok(_) => warn!(
                "Balance update for transaction {} on account {} failed, claim released: {}",
                record.id, record.account_id, err
            ),
            Err(release_err) => error!(
                "Failed to release claim on transaction {} for account {}: {}",
                record.id, record.account_id, release_err
            ),
        }
        err
    }

    /// Claim the transaction id. Returns the duplicate outcome when it was taken.
    async fn claim(&self, record: &TransactionRecord) -> Result<Option<TransactionOutcome>> {
        match self.log.record_if_absent(record).await? {
            RecordResult::Recorded => Ok(None),
            RecordResult::AlreadyExists(existing) => {
                warn!(
                    "Duplicate transaction {} on account {} (recorded as {:?})",
                    record.id, record.account_id, existing.status
                );
                Ok(Some(TransactionOutcome::Duplicate { status: existing.status }))
            }
        }
    }
}

fn validate(request: &TransactionRequest) -> Result<()> {
    if request.id.trim().is_empty() {
        return Err(Error::ValidationError("transaction id must not be empty".to_string()));
    }
    if request.account_id.trim().is_empty() {
        return Err(Error::ValidationError("accountId must not be empty".to_string()));
    }
    if request.account_id.contains(keys::SEPARATOR) {
        return Err(Error::ValidationError(format!(
            "accountId must not contain '{}'",
            keys::SEPARATOR
        )));
    }
    if request.amount <= Amount::ZERO {
        return Err(Error::ValidationError(format!("amount must be positive, got {}", request.amount)));
    }
    if precision::round_amount(request.amount) != request.amount {
        return Err(Error::ValidationError(format!(
            "amount {} has more than {} decimal places",
            request.amount,
            precision::AMOUNT_PRECISION
        )));
    }

    Ok(())
}
