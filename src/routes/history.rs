use axum::{extract::Query, extract::State, routing::get, Json, Router};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{AppState, LocationQuery};
use crate::config::MAX_HISTORY_DAYS;
use crate::{AqiError, HistoryEntry};

// ---

/// City used when the request names no location at all.
const DEFAULT_CITY: &str = "Delhi";

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/history", get(handler))
}

/// `GET /api/history?city=<name>[&days=<n>]`, oldest entry first.
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn handler(
    Query(params): Query<LocationQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, AqiError> {
    // ---
    info!("GET /api/history city={:?} days={:?}", params.city, params.days);

    let days = parse_days(params.days.as_deref(), state.config.history_days)?;
    let coord = params.coordinate()?;
    let city = params.city().or(coord.is_none().then_some(DEFAULT_CITY));

    let coord = state.resolver.resolve(city, coord).await?;
    let points = state.pollution.history(coord, days).await;

    Ok(Json(points.iter().map(|p| p.to_entry()).collect()))
}

fn parse_days(raw: Option<&str>, default: u32) -> Result<u32, AqiError> {
    // ---
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    raw.parse::<u32>()
        .ok()
        .filter(|d| (1..=MAX_HISTORY_DAYS).contains(d))
        .ok_or_else(|| {
            AqiError::invalid_input(
                "days",
                format!("Invalid value for 'days': {raw} (expected 1..={MAX_HISTORY_DAYS})"),
            )
        })
}
