//! Configuration loader for the `codemetal-airquality` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;

use anyhow::{anyhow, Result};

use crate::FeatureContract;

/// Parse an optional numeric variable with a default value.
macro_rules! parse_var {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string variable.
macro_rules! require_var {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Upper bound accepted for `HISTORY_DAYS` and the `days` query parameter.
pub const MAX_HISTORY_DAYS: u32 = 30;

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Listening port.
    pub port: u16,

    /// OpenWeather API key (`appid`).
    pub openweather_api_key: String,

    /// OpenWeather API base URL, without trailing slash.
    pub openweather_url: String,

    /// Geocoder (Nominatim-compatible) base URL.
    pub geocoder_url: String,

    /// User agent sent on every outbound request.
    pub user_agent: String,

    /// Timeout for every outbound call, in seconds.
    pub upstream_timeout_secs: u64,

    /// Default number of days returned by `/api/history`.
    pub history_days: u32,

    /// Path of the trained model file.
    pub model_path: String,

    /// Feature contract the prediction endpoint enforces.
    pub feature_contract: &'static FeatureContract,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `OPENWEATHER_API_KEY` – key for the air pollution API
///
/// Optional:
/// - `PORT` – listening port (default: 5000)
/// - `OPENWEATHER_URL` – default `http://api.openweathermap.org/data/2.5`
/// - `GEOCODER_URL` – default `https://nominatim.openstreetmap.org`
/// - `GEOCODER_USER_AGENT` – default `aqi_app`
/// - `UPSTREAM_TIMEOUT_SECS` – default 10
/// - `HISTORY_DAYS` – default 7, at most 30
/// - `MODEL_PATH` – default `model/model.gbdt`
/// - `FEATURE_CONTRACT` – default `weather-v1`
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    load_from(|name| env::var(name).ok())
}

/// Same as [`load_from_env`] over an arbitrary variable source.
pub fn load_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let openweather_api_key = require_var!(lookup, "OPENWEATHER_API_KEY");
    let port = parse_var!(lookup, "PORT", u16, 5000);
    let upstream_timeout_secs = parse_var!(lookup, "UPSTREAM_TIMEOUT_SECS", u64, 10);
    let history_days = parse_var!(lookup, "HISTORY_DAYS", u32, 7);

    let openweather_url = lookup("OPENWEATHER_URL")
        .unwrap_or_else(|| "http://api.openweathermap.org/data/2.5".to_string());
    let geocoder_url =
        lookup("GEOCODER_URL").unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string());
    let user_agent = lookup("GEOCODER_USER_AGENT").unwrap_or_else(|| "aqi_app".to_string());
    let model_path = lookup("MODEL_PATH").unwrap_or_else(|| "model/model.gbdt".to_string());

    let contract_name = lookup("FEATURE_CONTRACT").unwrap_or_else(|| "weather-v1".to_string());
    let feature_contract = FeatureContract::by_version(contract_name.trim())
        .ok_or_else(|| anyhow!("Invalid FEATURE_CONTRACT: unknown contract '{}'", contract_name))?;

    if upstream_timeout_secs == 0 {
        return Err(anyhow!("Invalid UPSTREAM_TIMEOUT_SECS: must be at least 1"));
    }
    if !(1..=MAX_HISTORY_DAYS).contains(&history_days) {
        return Err(anyhow!(
            "Invalid HISTORY_DAYS: must be between 1 and {}",
            MAX_HISTORY_DAYS
        ));
    }

    Ok(Config {
        port,
        openweather_api_key,
        openweather_url,
        geocoder_url,
        user_agent,
        upstream_timeout_secs,
        history_days,
        model_path,
        feature_contract,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the API key while showing all other values that were loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  PORT                  : {}", self.port);
        tracing::info!("  OPENWEATHER_API_KEY   : {}", mask_secret(&self.openweather_api_key));
        tracing::info!("  OPENWEATHER_URL       : {}", self.openweather_url);
        tracing::info!("  GEOCODER_URL          : {}", self.geocoder_url);
        tracing::info!("  GEOCODER_USER_AGENT   : {}", self.user_agent);
        tracing::info!("  UPSTREAM_TIMEOUT_SECS : {}", self.upstream_timeout_secs);
        tracing::info!("  HISTORY_DAYS          : {}", self.history_days);
        tracing::info!("  MODEL_PATH            : {}", self.model_path);
        tracing::info!("  FEATURE_CONTRACT      : {}", self.feature_contract.version);
    }
}

/// Keep the last four characters of a secret, mask the rest.
fn mask_secret(secret: &str) -> String {
    // ---
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
