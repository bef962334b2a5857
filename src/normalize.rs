//! Reshapes the provider's air-pollution payload into a [`PollutantReading`].
//!
//! Expected upstream shape (OpenWeather air pollution API):
//!
//! ```json
//! { "coord": {...}, "list": [ { "dt": 1700000000,
//!     "main": { "aqi": 3 },
//!     "components": { "co": 201.9, "pm2_5": 61.2, ... } } ] }
//! ```
//!
//! Only an absent or empty `list` is a hard failure; every other gap
//! degrades to a default.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{AqiCategory, AqiError, PollutantReading};

// ---

/// Normalize the first entry of the provider's result list.
pub fn normalize(raw: &Value) -> Result<PollutantReading, AqiError> {
    // ---
    let first = result_list(raw)
        .and_then(|list| list.first())
        .ok_or_else(|| AqiError::malformed("response has no 'list' entries"))?;

    let aqi = match first.pointer("/main/aqi") {
        Some(v) => {
            let category = v.as_i64().and_then(AqiCategory::from_index);
            if category.is_none() {
                tracing::warn!("Ignoring out-of-range AQI value from provider: {}", v);
            }
            category
        }
        None => None,
    };

    let components: BTreeMap<String, f64> = first
        .get("components")
        .and_then(|c| c.as_object())
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_f64().map(|f| (k.clone(), f)))
                .collect()
        })
        .unwrap_or_default();

    Ok(PollutantReading { aqi, components })
}

/// The provider's result list, if present and non-empty.
pub fn result_list(raw: &Value) -> Option<&Vec<Value>> {
    raw.get("list")
        .and_then(|l| l.as_array())
        .filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_payload() {
        // ---
        let raw = json!({
            "coord": {"lon": 77.209, "lat": 28.6139},
            "list": [{
                "dt": 1_700_000_000,
                "main": {"aqi": 4},
                "components": {"co": 201.94, "no": 0.0, "pm2_5": 61.2, "pm10": 90.5}
            }]
        });
        let reading = normalize(&raw).unwrap();

        assert_eq!(reading.aqi, AqiCategory::from_index(4));
        assert_eq!(reading.components.len(), 4);
        assert_eq!(reading.components["pm2_5"], 61.2);
        assert_eq!(reading.components["no"], 0.0);
    }

    #[test]
    fn test_missing_components_is_empty_map() {
        // ---
        let raw = json!({"list": [{"main": {"aqi": 2}}]});
        let reading = normalize(&raw).unwrap();

        assert_eq!(reading.aqi, AqiCategory::from_index(2));
        assert!(reading.components.is_empty());
    }

    #[test]
    fn test_empty_list_is_malformed() {
        // ---
        let err = normalize(&json!({"list": []})).unwrap_err();
        assert!(matches!(err, AqiError::MalformedUpstream(_)));
    }

    #[test]
    fn test_absent_list_is_malformed() {
        // ---
        for raw in [json!({}), json!({"list": "nope"}), json!([])] {
            let err = normalize(&raw).unwrap_err();
            assert!(matches!(err, AqiError::MalformedUpstream(_)));
        }
    }

    #[test]
    fn test_missing_or_bad_aqi_degrades_to_none() {
        // ---
        let raw = json!({"list": [{"components": {"o3": 12.5}}]});
        assert_eq!(normalize(&raw).unwrap().aqi, None);

        let raw = json!({"list": [{"main": {"aqi": 9}}]});
        assert_eq!(normalize(&raw).unwrap().aqi, None);

        let raw = json!({"list": [{"main": {"aqi": "3"}}]});
        assert_eq!(normalize(&raw).unwrap().aqi, None);
    }

    #[test]
    fn test_non_numeric_components_dropped() {
        // ---
        let raw = json!({"list": [{"main": {"aqi": 1}, "components": {"co": "n/a", "so2": 3.1}}]});
        let reading = normalize(&raw).unwrap();

        assert_eq!(reading.components.len(), 1);
        assert_eq!(reading.components["so2"], 3.1);
    }

    #[test]
    fn test_only_first_entry_used() {
        // ---
        let raw = json!({"list": [{"main": {"aqi": 1}}, {"main": {"aqi": 5}}]});
        assert_eq!(normalize(&raw).unwrap().aqi, AqiCategory::from_index(1));
    }
}
