//! Store key layout
//!
//! The layout is a compatibility contract with existing stores and must not change:
//! `balance:{accountId}` holds a decimal string and
//! `transactions:{accountId}:{transactionId}` holds a serialized transaction record.
//!
//! Account IDs must not contain the separator, otherwise two (account, transaction)
//! pairs can map to the same key.

/// Separator between key segments
pub const SEPARATOR: char = ':';

/// Prefix of every balance entry
pub const BALANCE_PREFIX: &str = "balance:";

/// Prefix of every transaction entry
pub const TRANSACTIONS_PREFIX: &str = "transactions:";

/// Balance key of an account
pub fn balance(account_id: &str) -> String {
    format!("{}{}", BALANCE_PREFIX, account_id)
}

/// Transaction key of a transaction on an account
pub fn transaction(account_id: &str, transaction_id: &str) -> String {
    format!("{}{}{}{}", TRANSACTIONS_PREFIX, account_id, SEPARATOR, transaction_id)
}

/// Prefix shared by all transaction keys of an account
pub fn transactions_of(account_id: &str) -> String {
    format!("{}{}{}", TRANSACTIONS_PREFIX, account_id, SEPARATOR)
}

/// Account ID encoded in a balance key
pub fn account_id_from_balance_key(key: &str) -> Option<&str> {
    key.strip_prefix(BALANCE_PREFIX)
}
