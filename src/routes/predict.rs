use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use super::AppState;
use crate::{models::DERIVED_SCALE, AqiError, PredictionResponse};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/predict", post(handler))
}

/// `POST /api/predict` with a JSON object holding every contract feature.
///
/// The prediction is on the derived 0..500 scale the estimator was trained on.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AqiError> {
    // ---
    let adapter = state.predictor.as_ref().ok_or_else(|| {
        AqiError::ServiceUnavailable("ML model not loaded. Prediction is unavailable.".into())
    })?;

    let Json(payload) = payload.map_err(|e| {
        AqiError::invalid_input("body", format!("Invalid JSON body: {}", e.body_text()))
    })?;
    let request = payload.as_object().ok_or_else(|| {
        AqiError::invalid_input(
            "body",
            format!(
                "Prediction request must be a JSON object. Expected features: {}",
                adapter.contract().describe()
            ),
        )
    })?;

    let result = adapter.predict(request)?;
    info!(
        "POST /api/predict contract={} prediction={}",
        adapter.contract().version,
        result.value
    );

    Ok(Json(PredictionResponse {
        prediction: result.value,
        scale: DERIVED_SCALE,
        contract: adapter.contract().version,
    }))
}
