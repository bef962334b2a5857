//! Geocoding provider access.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{AqiError, Coordinate};

// ---

/// Upstream city-name → coordinate lookup.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the provider has no match for `name`.
    async fn geocode(&self, name: &str) -> Result<Option<Coordinate>, AqiError>;
}

/// Nominatim (OpenStreetMap) search API.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: Client,
    base_url: String,
}

/// One Nominatim search hit. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

impl NominatimGeocoder {
    // ---
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, name: &str) -> Result<Option<Coordinate>, AqiError> {
        // ---
        let url = format!("{}/search", self.base_url);
        debug!("Geocoding '{}' via {}", name, url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AqiError::upstream(format!("Geocoding error for '{name}': {e}")))?;

        let status = res.status();
        if !status.is_success() {
            return Err(AqiError::upstream(format!(
                "Geocoding error for '{name}': provider returned status {status}"
            )));
        }

        let places: Vec<NominatimPlace> = res.json().await.map_err(|e| {
            AqiError::upstream(format!("Geocoding error for '{name}': invalid response: {e}"))
        })?;

        places.first().map(|place| parse_place(name, place)).transpose()
    }
}

fn parse_place(name: &str, place: &NominatimPlace) -> Result<Coordinate, AqiError> {
    // ---
    let invalid = || {
        AqiError::upstream(format!(
            "Geocoding error for '{name}': unusable coordinates ({}, {})",
            place.lat, place.lon
        ))
    };
    let lat: f64 = place.lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = place.lon.trim().parse().map_err(|_| invalid())?;
    let coord = Coordinate::new(lat, lon).map_err(|_| invalid())?;

    debug!(
        "Geocoded '{}' to {} ({:.4}, {:.4})",
        name, place.display_name, lat, lon
    );
    Ok(coord)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn place(lat: &str, lon: &str) -> NominatimPlace {
        NominatimPlace {
            lat: lat.to_string(),
            lon: lon.to_string(),
            display_name: "Kanpur, Uttar Pradesh, India".to_string(),
        }
    }

    #[test]
    fn test_parse_place() {
        // ---
        let coord = parse_place("Kanpur", &place("26.4609135", "80.3217588")).unwrap();
        assert_eq!(coord.latitude(), 26.4609135);
        assert_eq!(coord.longitude(), 80.3217588);
    }

    #[test]
    fn test_parse_place_rejects_garbage() {
        // ---
        let err = parse_place("Kanpur", &place("north", "80.3")).unwrap_err();
        assert!(matches!(err, AqiError::Upstream(_)));

        let err = parse_place("Kanpur", &place("123.0", "80.3")).unwrap_err();
        assert!(matches!(err, AqiError::Upstream(_)));
    }

    #[test]
    fn test_search_payload_shape() {
        // ---
        let body = r#"[{"place_id":1,"lat":"51.5073219","lon":"-0.1276474","display_name":"London"}]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(body).unwrap();
        let coord = parse_place("London", &places[0]).unwrap();
        assert_eq!(coord.longitude(), -0.1276474);

        let none: Vec<NominatimPlace> = serde_json::from_str("[]").unwrap();
        assert!(none.is_empty());
    }
}
