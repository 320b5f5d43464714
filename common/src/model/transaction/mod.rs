//! Transaction models and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credit the account
    Deposit,
    /// Read-only check that a withdrawal of the amount would currently succeed
    WithdrawRequest,
    /// Debit the account if funds allow
    Withdraw,
}

impl TransactionType {
    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::WithdrawRequest => "withdraw_request",
            TransactionType::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdraw_request" => Ok(TransactionType::WithdrawRequest),
            "withdraw" => Ok(TransactionType::Withdraw),
            other => Err(Error::InvalidTransactionType(other.to_string())),
        }
    }
}

/// Status carried by a transaction log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Dedup slot claimed, balance mutation not yet confirmed
    Pending,
    /// Balance mutation applied
    Applied,
    /// Withdrawal refused for insufficient funds
    Rejected,
}

/// Inbound transaction request as received from a client.
///
/// `type` is kept as a raw string so that unknown types reach the processor
/// and can be reported with the original payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Caller-supplied transaction ID, unique per account
    pub id: String,
    /// Transaction type name
    #[serde(rename = "type")]
    pub kind: String,
    /// Amount, must be positive
    #[cfg_attr(feature = "utoipa", schema(value_type = f64))]
    pub amount: Amount,
    /// Target account
    pub account_id: String,
    /// Client timestamp; defaults to the processing time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TransactionRequest {
    /// Create a request stamped with the current time
    pub fn new(
        id: impl Into<String>,
        kind: TransactionType,
        amount: Amount,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.as_str().to_string(),
            amount,
            account_id: account_id.into(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Parse the type field
    pub fn transaction_type(&self) -> Result<TransactionType, Error> {
        self.kind.parse()
    }
}

/// Transaction log entry as stored under `transactions:{accountId}:{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction ID
    pub id: String,
    /// Transaction type
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Amount
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub amount: Amount,
    /// Account the transaction applies to
    pub account_id: String,
    /// Transaction timestamp
    pub timestamp: DateTime<Utc>,
    /// Outcome of the balance mutation
    pub status: TransactionStatus,
}

impl TransactionRecord {
    /// Build a pending record from a validated request
    pub fn pending(request: &TransactionRequest, kind: TransactionType) -> Self {
        Self {
            id: request.id.clone(),
            kind,
            amount: request.amount,
            account_id: request.account_id.clone(),
            timestamp: request.timestamp.unwrap_or_else(Utc::now),
            status: TransactionStatus::Pending,
        }
    }

    /// Copy of the record with a final status
    pub fn with_status(&self, status: TransactionStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
