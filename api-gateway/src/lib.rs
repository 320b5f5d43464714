// api-gateway/src/lib.rs
pub mod api;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use ledger_service::LedgerService;
use utoipa::OpenApi;

use crate::api::{
    account::{get_account, get_transactions, list_accounts},
    status::get_status,
    transaction::create_transaction,
};

/// App state shared across handlers
pub struct AppState {
    /// Ledger service
    pub ledger_service: Arc<LedgerService>,
}

impl AppState {
    pub fn new(ledger_service: Arc<LedgerService>) -> Self {
        Self { ledger_service }
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        api::transaction::create_transaction,
        api::account::get_account,
        api::account::get_transactions,
        api::account::list_accounts,
        api::status::get_status,
    ),
    components(
        schemas(
            common::model::TransactionRequest,
            common::model::TransactionRecord,
            common::model::TransactionType,
            common::model::TransactionStatus,
            common::model::AccountBalance,
            api::transaction::TransactionResponse,
            api::status::StatusResponse,
        )
    ),
    tags(
        (name = "transaction", description = "Deposits and withdrawals"),
        (name = "account", description = "Account balances and history"),
        (name = "status", description = "Health check"),
        (name = "debug", description = "Diagnostics")
    ),
    info(
        title = "Balance Ledger API",
        version = "0.1.0",
        description = "Account-balance ledger with idempotent deposits and withdrawals"
    )
)]
pub struct ApiDoc;

/// Build the application router without transport layers
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/transaction", post(create_transaction))
        .route("/account/:accountId", get(get_account))
        .route("/account/:accountId/transactions", get(get_transactions))
        .route("/debug/accounts", get(list_accounts))
        .route("/status", get(get_status))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .with_state(state)
}
