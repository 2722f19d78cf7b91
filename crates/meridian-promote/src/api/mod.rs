//! HTTP API for triggering promotions.
//!
//! Provides endpoints for:
//! - Running a promotion for a package group
//! - Health checks

mod promotions;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::Pipeline;

pub use promotions::{ErrorResponse, PromotionRequest};

/// Shared application state for the trigger API.
#[derive(Clone)]
pub struct AppState {
    /// Pipeline run for each promotion request.
    pub pipeline: Arc<Pipeline>,
    /// Package group used when a request names none.
    pub default_group: String,
}

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/promotions", post(promotions::create_promotion))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse { status: "healthy" })
}

/// Health response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
}
