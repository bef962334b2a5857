//! Error taxonomy for the air quality service.
//!
//! Every component returns `Result<T, AqiError>`; handlers propagate the
//! error with `?` and the [`IntoResponse`] impl below turns it into a JSON
//! body of the form `{ "error": "<message>" }` with the matching status.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use thiserror::Error;

// ---

/// Failure kinds surfaced by the AQI pipeline and the prediction path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AqiError {
    /// Neither a city nor a full coordinate pair was supplied.
    #[error("Missing coordinates or city name.")]
    MissingLocation,

    /// Caller input failed validation (bad coordinate, missing feature, ...).
    #[error("{message}")]
    InvalidInput { field: String, message: String },

    /// The city could not be resolved to a location.
    #[error("City '{0}' not found.")]
    NotFound(String),

    /// An upstream call failed, timed out or returned a non-2xx status.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The upstream answered but the payload did not have the expected shape.
    #[error("Malformed upstream response: {0}")]
    MalformedUpstream(String),

    /// The provider returned an empty or missing result list.
    #[error("No AQI data found for the given coordinates.")]
    NoData,

    /// The estimator failed internally (contract/model mismatch).
    #[error("Prediction failed due to internal model error: {0}")]
    Prediction(String),

    /// No estimator was loaded at startup.
    #[error("{0}")]
    ServiceUnavailable(String),
}

impl AqiError {
    // ---
    pub fn invalid_input<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream(message.into())
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedUpstream(message.into())
    }

    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        // ---
        match self {
            AqiError::MissingLocation | AqiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AqiError::NotFound(_) => StatusCode::NOT_FOUND,
            AqiError::Upstream(_) | AqiError::MalformedUpstream(_) | AqiError::NoData => {
                StatusCode::BAD_GATEWAY
            }
            AqiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AqiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// JSON body for every error response.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AqiError {
    fn into_response(self) -> Response {
        // ---
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::warn!(status = status.as_u16(), "{}", self);
        }

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_status_mapping() {
        // ---
        assert_eq!(AqiError::MissingLocation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AqiError::invalid_input("lat", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AqiError::NotFound("Atlantis".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AqiError::upstream("boom").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AqiError::malformed("x").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AqiError::NoData.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AqiError::Prediction("shape".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AqiError::ServiceUnavailable("no model".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_messages_name_the_input() {
        // ---
        let err = AqiError::NotFound("Nonexistent_City_Xyz".into());
        assert_eq!(err.to_string(), "City 'Nonexistent_City_Xyz' not found.");

        let err = AqiError::invalid_input("humidity", "Missing or invalid value for 'humidity'");
        assert!(err.to_string().contains("humidity"));
    }

    #[tokio::test]
    async fn test_response_body_is_json_error() {
        // ---
        let response = AqiError::NoData.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["error"],
            "No AQI data found for the given coordinates."
        );
    }
}
