//! Account API handlers
//!
//! Handles read-only endpoints related to accounts:
//! - Get account balance
//! - Get account transaction history
//! - List all account balances (debug)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::model::{AccountBalance, TransactionRecord};

use crate::api::response::ApiListResponse;
use crate::error::ApiError;
use crate::AppState;

/// Get the balance of an account
///
/// Unknown accounts report a zero balance.
#[utoipa::path(
    get,
    path = "/account/{accountId}",
    params(
        ("accountId" = String, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account balance retrieved successfully", body = AccountBalance),
        (status = 503, description = "Ledger store unavailable")
    ),
    tag = "account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountBalance>, ApiError> {
    let balance = state.ledger_service.get_balance(&account_id).await?;
    Ok(Json(balance))
}

/// Get the recorded transactions of an account
#[utoipa::path(
    get,
    path = "/account/{accountId}/transactions",
    params(
        ("accountId" = String, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Transactions retrieved successfully"),
        (status = 503, description = "Ledger store unavailable")
    ),
    tag = "account"
)]
pub async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<ApiListResponse<TransactionRecord>, ApiError> {
    let records = state.ledger_service.list_transactions(&account_id).await?;
    Ok(ApiListResponse::new(records))
}

/// List the balances of all known accounts
#[utoipa::path(
    get,
    path = "/debug/accounts",
    responses(
        (status = 200, description = "Balances retrieved successfully"),
        (status = 503, description = "Ledger store unavailable")
    ),
    tag = "debug"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<ApiListResponse<AccountBalance>, ApiError> {
    let balances = state.ledger_service.list_balances().await?;
    Ok(ApiListResponse::new(balances))
}
