//! Versioned feature contracts.
//!
//! A contract is the ordered list of named numeric inputs a trained estimator
//! expects. Each contract is declared exactly once here and referenced by the
//! trainer, the model file, the request validator and the client payload
//! builder, so the four can never disagree.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::AqiError;

// ---

/// An ordered, versioned estimator input schema.
#[derive(Debug, PartialEq, Eq)]
pub struct FeatureContract {
    pub version: &'static str,
    pub features: &'static [&'static str],
}

/// Meteorological contract used by the shipped sample model.
pub static WEATHER_V1: FeatureContract = FeatureContract {
    version: "weather-v1",
    features: &["pm2_5", "humidity", "temperature"],
};

/// Full OpenWeather pollutant component set.
pub static POLLUTANTS_V2: FeatureContract = FeatureContract {
    version: "pollutants-v2",
    features: &["co", "no", "no2", "o3", "so2", "pm2_5", "pm10", "nh3"],
};

/// Every contract the service knows about.
pub static CONTRACTS: [&FeatureContract; 2] = [&WEATHER_V1, &POLLUTANTS_V2];

impl FeatureContract {
    // ---
    /// Look up a contract by its version string.
    pub fn by_version(version: &str) -> Option<&'static FeatureContract> {
        CONTRACTS.iter().copied().find(|c| c.version == version)
    }

    /// Comma separated feature list, used in error messages.
    pub fn describe(&self) -> String {
        self.features.join(", ")
    }

    /// Whether `names` lists exactly this contract's features in order.
    pub fn matches(&self, names: &[String]) -> bool {
        names.len() == self.features.len()
            && names.iter().zip(self.features).all(|(a, b)| a == b)
    }

    /// Build a request payload for `POST /api/predict`.
    ///
    /// Fails on the first contract feature missing from `values`, so a
    /// client can never send a payload the server would reject for shape.
    pub fn build_payload(
        &self,
        values: &HashMap<String, f64>,
    ) -> Result<Map<String, Value>, AqiError> {
        // ---
        let mut payload = Map::new();
        for name in self.features {
            let value = values.get(*name).ok_or_else(|| {
                AqiError::invalid_input(
                    *name,
                    format!(
                        "Missing value for '{name}'. Expected features: {}",
                        self.describe()
                    ),
                )
            })?;
            payload.insert((*name).to_string(), Value::from(*value));
        }
        Ok(payload)
    }
}
