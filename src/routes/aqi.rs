use axum::{extract::Query, extract::State, routing::get, Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{AppState, LocationQuery};
use crate::{AqiError, AqiResponse};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/aqi", get(handler))
}

/// `GET /api/aqi?city=<name>` or `?lat=<f>&lon=<f>`.
///
/// The `aqi` field is the provider's 1..5 category.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn handler(
    Query(params): Query<LocationQuery>,
    State(state): State<AppState>,
) -> Result<Json<AqiResponse>, AqiError> {
    // ---
    info!("GET /api/aqi city={:?} lat={:?} lon={:?}", params.city, params.lat, params.lon);

    let coord = state
        .resolver
        .resolve(params.city(), params.coordinate()?)
        .await?;
    let reading = state.pollution.current(coord).await?;

    info!(
        "AQI for ({}, {}) is {:?}",
        coord.latitude(),
        coord.longitude(),
        reading.aqi.map(|a| a.index())
    );
    Ok(Json(reading.to_response(coord)))
}
