//! Transaction API handler
//!
//! `POST /transaction` accepts deposits, withdrawal pre-checks and withdrawals.
//! Insufficient funds and replays are normal outcomes and map to status codes
//! here; only malformed requests and store faults become `ApiError`s.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use common::decimal::Amount;
use common::error::Error;
use common::model::{TransactionRequest, TransactionStatus, TransactionType};
use ledger_service::TransactionOutcome;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::AppState;

/// Result of a processed transaction
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Human-readable outcome
    pub detail: String,
    /// Account the transaction targeted
    pub account_id: String,
    /// Transaction ID
    pub transaction_id: String,
    /// Balance after an applied deposit or withdrawal
    #[serde(with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub balance: Option<Amount>,
}

/// Process a transaction
#[utoipa::path(
    post,
    path = "/transaction",
    request_body = TransactionRequest,
    responses(
        (status = 200, description = "Deposit or withdrawal applied, or replay of an applied transaction", body = TransactionResponse),
        (status = 201, description = "withdraw_request: sufficient funds", body = TransactionResponse),
        (status = 202, description = "Replay of a transaction whose outcome is not yet recorded", body = TransactionResponse),
        (status = 400, description = "Malformed request or unknown transaction type"),
        (status = 402, description = "Insufficient funds", body = TransactionResponse),
        (status = 503, description = "Ledger store unavailable; retry with the same transaction id")
    ),
    tag = "transaction"
)]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let Json(payload) = payload.map_err(|e| Error::ValidationError(e.body_text()))?;

    let request: TransactionRequest = match serde_json::from_value(payload.clone()) {
        Ok(request) => request,
        Err(e) => {
            // An unknown type wins over other defects so the client sees the echo
            if has_unknown_type(&payload) {
                return Err(ApiError::InvalidTransactionType { payload });
            }
            return Err(Error::ValidationError(format!("Malformed transaction: {}", e)).into());
        }
    };

    let outcome = match state.ledger_service.process_transaction(&request).await {
        Ok(outcome) => outcome,
        Err(Error::InvalidTransactionType(_)) => return Err(ApiError::InvalidTransactionType { payload }),
        Err(e) => return Err(ApiError::Common(e)),
    };

    let (status, detail, balance) = match outcome {
        TransactionOutcome::Applied { balance } => (StatusCode::OK, "Transaction applied", Some(balance)),
        TransactionOutcome::Sufficient => (StatusCode::CREATED, "withdraw_request approved", None),
        TransactionOutcome::Insufficient | TransactionOutcome::Rejected => {
            (StatusCode::PAYMENT_REQUIRED, "Insufficient funds", None)
        }
        TransactionOutcome::Duplicate { status } => match status {
            TransactionStatus::Applied => (StatusCode::OK, "Transaction already processed", None),
            TransactionStatus::Pending => (StatusCode::ACCEPTED, "Transaction already in progress", None),
            TransactionStatus::Rejected => {
                (StatusCode::PAYMENT_REQUIRED, "Transaction already rejected: insufficient funds", None)
            }
        },
    };

    Ok((
        status,
        Json(TransactionResponse {
            detail: detail.to_string(),
            account_id: request.account_id,
            transaction_id: request.id,
            balance,
        }),
    ))
}

fn has_unknown_type(payload: &serde_json::Value) -> bool {
    match payload.get("type") {
        Some(serde_json::Value::String(kind)) => kind.parse::<TransactionType>().is_err(),
        Some(serde_json::Value::Null) | None => false,
        Some(_) => true,
    }
}
