//! Error handling for the API gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error information
    pub error: ErrorInfo,
    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Detailed error information
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unknown transaction type; the payload is echoed back to the client
    #[error("Invalid transaction type")]
    InvalidTransactionType { payload: serde_json::Value },

    #[error("{0}")]
    Common(#[from] common::error::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::InvalidTransactionType { payload } => {
                tracing::warn!("Rejected transaction with invalid type: {}", payload);
                let body = serde_json::json!({
                    "message": "Invalid transaction type",
                    "transaction": payload,
                });
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            ApiError::Common(err) => err,
        };

        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();

        let (status, code, details) = match &err {
            // Client errors (4xx)
            common::error::Error::ValidationError(_) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                None
            ),
            common::error::Error::InvalidTransactionType(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_transaction_type",
                None
            ),

            // Store faults: the effect is unknown, clients retry with the same id
            common::error::Error::StoreUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                None
            ),
            common::error::Error::Database(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "database_error",
                Some(serde_json::json!({
                    "db_error": e.to_string(),
                    "code": e.as_database_error().map(|dbe| dbe.code().map(|c| c.to_string())),
                }))
            ),

            // Server errors (5xx)
            common::error::Error::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                None
            ),
            common::error::Error::Migration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "migration_error",
                None
            ),
            common::error::Error::Serialization(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialization_error",
                None
            ),
            common::error::Error::DecimalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "decimal_error",
                None
            ),
        };

        if status.is_server_error() {
            tracing::error!("API Error [{}]: {:?}", request_id, &err);
        } else {
            tracing::warn!("API Error [{}]: {}", request_id, &err);
        }

        let error_response = ErrorResponse {
            error: ErrorInfo {
                code: code.to_string(),
                message: err.to_string(),
                details,
            },
            request_id: Some(request_id),
        };

        (status, Json(error_response)).into_response()
    }
}
