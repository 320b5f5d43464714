//! Health check handler

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

/// Service health
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// `ok` or `error`
    pub status: String,
    /// Store connectivity, present when healthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    /// Failure description, present when unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Report service and store health
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Service and store are healthy", body = StatusResponse),
        (status = 500, description = "Store unreachable", body = StatusResponse)
    ),
    tag = "status"
)]
pub async fn get_status(State(state): State<Arc<AppState>>) -> Response {
    match state.ledger_service.check_store().await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: "ok".to_string(),
                store: Some("connected".to_string()),
                message: None,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Store health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatusResponse {
                    status: "error".to_string(),
                    store: None,
                    message: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}
