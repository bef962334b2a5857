// src/routes/health.rs
//! API health check endpoint for the air quality backend.
//!
//! This module defines the `/health` route used by container orchestrators
//! and CI pipelines to verify that the service is running. Besides liveness
//! it reports whether an estimator was loaded and which feature contract the
//! prediction endpoint enforces.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    contract: &'static str,
}

/// Handle `GET /health`.
///
/// Does not touch the upstream providers.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.predictor.is_some(),
        contract: state.config.feature_contract.version,
    })
}

/// Create a subrouter containing the `/health` route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
