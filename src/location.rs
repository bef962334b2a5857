//! Location resolution: city name or raw coordinates → [`Coordinate`].

use std::sync::Arc;

use tracing::debug;

use crate::{AqiError, Coordinate, Geocoder};

// ---

/// Cities answered from this table never reach the geocoder.
const KNOWN_CITIES: &[(&str, f64, f64)] = &[
    ("delhi", 28.6139, 77.2090),
    ("new delhi", 28.6139, 77.2090),
    ("mumbai", 19.0760, 72.8777),
    ("kolkata", 22.5726, 88.3639),
    ("chennai", 13.0827, 80.2707),
    ("bengaluru", 12.9716, 77.5946),
    ("kanpur", 26.4499, 80.3312),
    ("london", 51.5074, -0.1278),
];

/// Static lookup, case- and whitespace-insensitive.
pub fn known_city(name: &str) -> Option<Coordinate> {
    // ---
    let key = name.trim().to_lowercase();
    KNOWN_CITIES
        .iter()
        .find(|(city, _, _)| *city == key)
        .and_then(|&(_, lat, lon)| Coordinate::new(lat, lon).ok())
}

/// Resolves request input to a coordinate, consulting the geocoder only
/// for cities missing from the static table.
#[derive(Clone)]
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    // ---
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// An explicit coordinate wins over a city; a blank city counts as absent.
    pub async fn resolve(
        &self,
        city: Option<&str>,
        coord: Option<Coordinate>,
    ) -> Result<Coordinate, AqiError> {
        // ---
        if let Some(coord) = coord {
            return Ok(coord);
        }

        let city = city
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AqiError::MissingLocation)?;

        if let Some(coord) = known_city(city) {
            debug!("Resolved '{}' from the known city table", city);
            return Ok(coord);
        }

        match self.geocoder.geocode(city).await? {
            Some(coord) => Ok(coord),
            None => Err(AqiError::NotFound(city.to_string())),
        }
    }
}
