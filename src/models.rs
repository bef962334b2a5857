//! Data models for the air quality pipeline.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::AqiError;

// ---

/// Label for the provider's 1..5 category scale, reported next to every AQI.
pub const CATEGORY_SCALE: &str = "category_1_5";

/// Label for the derived 0..500 scale (category x 50, or the estimator target).
pub const DERIVED_SCALE: &str = "index_0_500";

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    // ---
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, AqiError> {
        // ---
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AqiError::invalid_input(
                "lat",
                format!("Latitude {latitude} is outside [-90, 90]."),
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AqiError::invalid_input(
                "lon",
                format!("Longitude {longitude} is outside [-180, 180]."),
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// The provider's AQI category, 1 (Good) through 5 (Very Poor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AqiCategory(u8);

impl AqiCategory {
    // ---
    /// Returns `None` for anything outside 1..=5.
    pub fn from_index(index: i64) -> Option<Self> {
        (1..=5).contains(&index).then_some(Self(index as u8))
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "Good",
            2 => "Fair",
            3 => "Moderate",
            4 => "Poor",
            _ => "Very Poor",
        }
    }

    /// The category mapped onto the 0..500 scale.
    pub fn derived_index(&self) -> u16 {
        u16::from(self.0) * 50
    }
}

/// Normalized reading for one coordinate at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantReading {
    pub aqi: Option<AqiCategory>,
    /// Pollutant symbol (co, no, no2, o3, so2, pm2_5, pm10, nh3) to μg/m³.
    pub components: BTreeMap<String, f64>,
}

/// One day of AQI history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub aqi: AqiCategory,
}

/// Output of the estimator, already rounded for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub value: f64,
}

/// Response body for `GET /api/aqi`.
#[derive(Debug, Serialize)]
pub struct AqiResponse {
    pub lat: f64,
    pub lon: f64,
    pub aqi: Option<AqiCategory>,
    pub aqi_scale: &'static str,
    pub aqi_label: Option<&'static str>,
    pub aqi_derived_0_500: Option<u16>,
    pub components: BTreeMap<String, f64>,
}

/// Response item for `GET /api/history`.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub aqi: AqiCategory,
    pub aqi_scale: &'static str,
}

/// Response body for `POST /api/predict`.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: f64,
    pub scale: &'static str,
    pub contract: &'static str,
}

impl PollutantReading {
    // ---
    pub fn to_response(&self, coord: Coordinate) -> AqiResponse {
        // ---
        AqiResponse {
            lat: coord.latitude(),
            lon: coord.longitude(),
            aqi: self.aqi,
            aqi_scale: CATEGORY_SCALE,
            aqi_label: self.aqi.map(|a| a.label()),
            aqi_derived_0_500: self.aqi.map(|a| a.derived_index()),
            components: self.components.clone(),
        }
    }
}

impl HistoryPoint {
    pub fn to_entry(&self) -> HistoryEntry {
        HistoryEntry {
            date: self.date,
            aqi: self.aqi,
            aqi_scale: CATEGORY_SCALE,
        }
    }
}
