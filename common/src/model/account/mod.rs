//! Account models and related types

use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Current balance of a single account.
///
/// Accounts have no record of their own: an account exists once its balance
/// entry does, and an absent entry reads as a zero balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    /// Externally assigned account ID
    pub account_id: String,
    /// Balance, serialized as a JSON number
    #[serde(with = "rust_decimal::serde::float")]
    #[cfg_attr(feature = "utoipa", schema(value_type = f64))]
    pub balance: Amount,
}

impl AccountBalance {
    /// Create a balance view for an account
    pub fn new(account_id: impl Into<String>, balance: Amount) -> Self {
        Self {
            account_id: account_id.into(),
            balance,
        }
    }
}
