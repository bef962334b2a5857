//! Air quality backend: location resolution, pollutant retrieval and
//! normalization, and AQI prediction behind a small axum API.
//!
//! This crate follows the Explicit Module Boundary Pattern (EMBP): sibling
//! modules import what they need from the crate root re-exports below rather
//! than reaching into each other's files, so moving code between modules only
//! touches this gateway.

pub mod config;
pub mod contract;
pub mod error;
pub mod estimator;
pub mod geocoder;
pub mod location;
pub mod models;
pub mod normalize;
pub mod pollution;
pub mod predict;
pub mod routes;

pub use config::Config;
pub use contract::FeatureContract;
pub use error::AqiError;
pub use estimator::{BoostedModel, Estimator, TrainParams};
pub use geocoder::{Geocoder, NominatimGeocoder};
pub use location::LocationResolver;
pub use models::{
    AqiCategory, AqiResponse, Coordinate, HistoryEntry, HistoryPoint, PollutantReading,
    PredictionResponse, PredictionResult,
};
pub use pollution::{OpenWeatherProvider, PollutionClient, PollutionProvider, TimeWindow};
pub use predict::PredictionAdapter;
pub use routes::{router, AppState};
