//! Prediction adapter: loosely typed JSON payload → contract-ordered vector
//! → estimator → rounded AQI estimate.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::estimator::EstimatorError;
use crate::{AqiError, Estimator, FeatureContract, PredictionResult};

// ---

/// Binds an estimator to the contract the service enforces on requests.
#[derive(Clone)]
pub struct PredictionAdapter {
    estimator: Arc<dyn Estimator>,
    contract: &'static FeatureContract,
}

impl PredictionAdapter {
    // ---
    /// Fails when the estimator was trained on a different contract.
    pub fn new(
        estimator: Arc<dyn Estimator>,
        contract: &'static FeatureContract,
    ) -> Result<Self, EstimatorError> {
        // ---
        let trained = estimator.contract();
        if trained != contract {
            return Err(EstimatorError::ContractMismatch {
                trained: trained.version,
                enforced: contract.version,
            });
        }
        Ok(Self {
            estimator,
            contract,
        })
    }

    pub fn contract(&self) -> &'static FeatureContract {
        self.contract
    }

    /// Validate `request` against the contract and run the estimator.
    pub fn predict(&self, request: &Map<String, Value>) -> Result<PredictionResult, AqiError> {
        // ---
        let vector = assemble_features(request, self.contract)?;
        tracing::debug!(contract = self.contract.version, ?vector, "assembled feature vector");

        let raw = self
            .estimator
            .predict(&vector)
            .map_err(|e| AqiError::Prediction(e.to_string()))?;

        Ok(PredictionResult {
            value: round2(raw),
        })
    }
}

/// Pull every contract feature out of `request`, in contract order.
///
/// The first missing or non-numeric feature aborts with `InvalidInput`
/// naming it.
pub fn assemble_features(
    request: &Map<String, Value>,
    contract: &FeatureContract,
) -> Result<Vec<f64>, AqiError> {
    // ---
    contract
        .features
        .iter()
        .map(|name| {
            request.get(*name).and_then(coerce_f64).ok_or_else(|| {
                AqiError::invalid_input(
                    *name,
                    format!(
                        "Missing or invalid value for '{name}' in prediction request. \
                         Expected features: {}",
                        contract.describe()
                    ),
                )
            })
        })
        .collect()
}

/// Numbers and numeric strings are accepted; anything else is not.
fn coerce_f64(value: &Value) -> Option<f64> {
    // ---
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
