//! Route gateway: merges every subrouter and binds the shared state.

use std::sync::Arc;

use axum::Router;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::{AqiError, Config, Coordinate, LocationResolver, PollutionClient, PredictionAdapter};

mod aqi;
mod health;
mod history;
mod predict;

// ---

/// Immutable dependencies shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<LocationResolver>,
    pub pollution: Arc<PollutionClient>,
    /// `None` when no model could be loaded at startup.
    pub predictor: Option<Arc<PredictionAdapter>>,
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(aqi::router())
        .merge(history::router())
        .merge(predict::router())
        .merge(health::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Location query shared by `/api/aqi` and `/api/history`.
///
/// Values stay strings so malformed numbers produce a JSON 400 instead of
/// the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct LocationQuery {
    pub city: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub days: Option<String>,
}

impl LocationQuery {
    // ---
    /// A coordinate when both `lat` and `lon` are present and non-blank.
    ///
    /// An unparsable or out-of-range pair is an error only when no city was
    /// given; with a city the pair is dropped and the city is used instead.
    pub fn coordinate(&self) -> Result<Option<Coordinate>, AqiError> {
        // ---
        let (Some(lat), Some(lon)) = (present(&self.lat), present(&self.lon)) else {
            return Ok(None);
        };

        let parsed = parse_number("lat", lat)
            .and_then(|lat| Coordinate::new(lat, parse_number("lon", lon)?));

        match parsed {
            Ok(coord) => Ok(Some(coord)),
            Err(e) if self.city().is_some() => {
                warn!("Ignoring bad coordinate ({e}); falling back to city");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The city name, if non-blank.
    pub fn city(&self) -> Option<&str> {
        present(&self.city)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(field: &str, raw: &str) -> Result<f64, AqiError> {
    raw.parse::<f64>()
        .map_err(|_| AqiError::invalid_input(field, format!("Invalid value for '{field}': {raw}")))
}
