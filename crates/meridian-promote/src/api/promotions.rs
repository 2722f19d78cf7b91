//! Promotion trigger endpoint.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PromoteError;
use crate::pipeline::PipelineReport;

use super::AppState;

/// Request to promote a package group.
///
/// An empty body promotes the configured default group.
#[derive(Debug, Default, Deserialize)]
pub struct PromotionRequest {
    /// Package group to promote.
    pub group: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Run a promotion to completion and report the result.
pub async fn create_promotion(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PipelineReport>, ApiError> {
    let request = parse_request(&body)?;
    let group = request.group.unwrap_or(state.default_group);

    info!(group = %group, "promotion requested via API");

    // A dropped request must not stop a run between steps.
    let pipeline = Arc::clone(&state.pipeline);
    let run = tokio::spawn(async move { pipeline.run(&group).await });

    run.await
        .unwrap_or_else(|e| Err(PromoteError::internal(format!("promotion task failed: {e}"))))
        .map(Json)
        .map_err(|e| {
            (
                error_to_status(&e),
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
        })
}

fn parse_request(body: &[u8]) -> Result<PromotionRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(PromotionRequest::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid request body: {e}"),
            }),
        )
    })
}

/// Map an error to the appropriate HTTP status code.
const fn error_to_status(error: &PromoteError) -> StatusCode {
    match error {
        PromoteError::NotFound { .. } => StatusCode::NOT_FOUND,
        PromoteError::Provision(_) | PromoteError::Registry(_) | PromoteError::Http(_) => {
            StatusCode::BAD_GATEWAY
        }
        PromoteError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
        PromoteError::Config(_) => StatusCode::BAD_REQUEST,
        PromoteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
