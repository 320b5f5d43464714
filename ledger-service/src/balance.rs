//! Account balance manager
//!
//! Owns every write to `balance:{accountId}` entries. Balances are only ever
//! changed through the store's atomic primitives: deposits are an atomic
//! increment and withdrawals an atomic decrement-if-sufficient. A balance is
//! never read, adjusted locally, and written back, so two concurrent
//! withdrawals cannot both pass the funds check.

use std::sync::Arc;

use common::decimal::{from_store_value, Amount};
use common::error::{ErrorExt, Result};
use common::model::AccountBalance;
use common::store::{keys, LedgerStore};
use tracing::{debug, info};

/// Result of an attempted withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalResult {
    /// Funds were debited; carries the new balance
    Succeeded { balance: Amount },
    /// Balance was below the amount; nothing was written
    InsufficientFunds,
}

/// Result of a read-only sufficiency check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sufficiency {
    Sufficient,
    Insufficient,
}

/// Reads and mutates account balances through the ledger store
#[derive(Clone)]
pub struct BalanceManager {
    store: Arc<dyn LedgerStore>,
}

impl BalanceManager {
    /// Create a balance manager over a store handle
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Current balance of an account; unknown accounts hold zero
    pub async fn get_balance(&self, account_id: &str) -> Result<Amount> {
        debug!("Reading balance of account {}", account_id);

        match self.store.get(&keys::balance(account_id)).await? {
            Some(value) => from_store_value(&value)
                .with_context(|| format!("Corrupt balance entry for account {}", account_id)),
            None => Ok(Amount::ZERO),
        }
    }

    /// Credit an account. Creates the balance entry on first deposit.
    pub async fn apply_deposit(&self, account_id: &str, amount: Amount) -> Result<Amount> {
        let balance = self.store.increment(&keys::balance(account_id), amount).await
            .with_context(|| format!("Failed to credit {} to account {}", amount, account_id))?;

        info!("Deposited {} to account {}, balance now {}", amount, account_id, balance);
        Ok(balance)
    }

    /// Debit an account if, and only if, its balance covers the amount.
    ///
    /// The check and the debit are one store operation.
    pub async fn try_apply_withdrawal(&self, account_id: &str, amount: Amount) -> Result<WithdrawalResult> {
        let result = self.store.decrement_if_sufficient(&keys::balance(account_id), amount).await
            .with_context(|| format!("Failed to debit {} from account {}", amount, account_id))?;

        match result {
            Some(balance) => {
                info!("Withdrew {} from account {}, balance now {}", amount, account_id, balance);
                Ok(WithdrawalResult::Succeeded { balance })
            }
            None => {
                info!("Refused withdrawal of {} from account {}: insufficient funds", amount, account_id);
                Ok(WithdrawalResult::InsufficientFunds)
            }
        }
    }

    /// Whether the account currently holds at least `amount`.
    ///
    /// Advisory only: nothing is reserved, and a concurrent withdrawal may
    /// consume the funds before a later `try_apply_withdrawal`.
    pub async fn peek_sufficiency(&self, account_id: &str, amount: Amount) -> Result<Sufficiency> {
        let balance = self.get_balance(account_id).await?;

        if balance >= amount {
            Ok(Sufficiency::Sufficient)
        } else {
            Ok(Sufficiency::Insufficient)
        }
    }

    /// Balances of every account that has one, ordered by account ID
    pub async fn list_balances(&self) -> Result<Vec<AccountBalance>> {
        let entries = self.store.scan_prefix(keys::BALANCE_PREFIX).await?;

        let mut balances = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if let Some(account_id) = keys::account_id_from_balance_key(&key) {
                balances.push(AccountBalance::new(account_id, from_store_value(&value)?));
            }
        }

        Ok(balances)
    }
}
