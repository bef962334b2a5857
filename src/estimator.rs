//! Regression estimator for AQI prediction.
//!
//! The estimator is a gradient boosted tree ensemble from the `gbdt` crate. It
//! is trained by the `train-model` binary and loaded once at server startup.
//! Two files are written side by side: the `gbdt` model itself and a JSON
//! meta file recording the feature contract (version and feature order) the
//! model was trained against. Loading fails if that record does not match a
//! known contract exactly.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use gbdt::config::Config as GbdtConfig;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::predict::assemble_features;
use crate::FeatureContract;

// ---

pub const DEFAULT_ITERATIONS: usize = 200;
pub const DEFAULT_MAX_DEPTH: u32 = 4;
pub const DEFAULT_SHRINKAGE: f32 = 0.1;

/// Failure inside the estimator itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("estimator produced a non-finite value")]
    NonFinite,

    #[error("estimator was trained on contract '{trained}' but the service enforces '{enforced}'")]
    ContractMismatch {
        trained: &'static str,
        enforced: &'static str,
    },
}

/// A trained model that maps a feature vector onto a scalar AQI.
///
/// Implementations are read-only after construction and shared across
/// request handlers behind an `Arc`.
pub trait Estimator: Send + Sync {
    /// The contract the estimator was trained with.
    fn contract(&self) -> &'static FeatureContract;

    /// Predict for one vector laid out in contract order.
    fn predict(&self, features: &[f64]) -> Result<f64, EstimatorError>;
}

/// Boosting hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainParams {
    pub iterations: usize,
    pub max_depth: u32,
    pub shrinkage: f32,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            max_depth: DEFAULT_MAX_DEPTH,
            shrinkage: DEFAULT_SHRINKAGE,
        }
    }
}

/// Contents of the meta file written next to the `gbdt` model.
#[derive(Debug, Serialize, Deserialize)]
struct ModelMeta {
    contract: String,
    feat_list: Vec<String>,
    training_rows: usize,
    trained_at: DateTime<Utc>,
    iterations: usize,
    max_depth: u32,
    shrinkage: f32,
}

/// Where the meta file for the model at `model_path` lives:
/// `model/model.gbdt` → `model/model.meta.json`.
pub fn meta_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("meta.json")
}

/// Gradient boosted regression trees bound to a feature contract.
pub struct BoostedModel {
    contract: &'static FeatureContract,
    gbdt: GBDT,
    params: TrainParams,
    training_rows: usize,
    trained_at: DateTime<Utc>,
}

impl fmt::Debug for BoostedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoostedModel")
            .field("contract", &self.contract.version)
            .field("params", &self.params)
            .field("training_rows", &self.training_rows)
            .field("trained_at", &self.trained_at)
            .finish_non_exhaustive()
    }
}

impl BoostedModel {
    // ---
    /// Fit a model to `rows` (each laid out in contract order) and `targets`.
    pub fn fit(
        contract: &'static FeatureContract,
        rows: &[Vec<f64>],
        targets: &[f64],
        params: TrainParams,
    ) -> Result<Self> {
        // ---
        let n_features = contract.features.len();
        if rows.is_empty() {
            bail!("cannot train on an empty dataset");
        }
        if rows.len() != targets.len() {
            bail!(
                "dataset has {} rows but {} targets",
                rows.len(),
                targets.len()
            );
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_features) {
            bail!(
                "row {} has {} features, contract '{}' expects {}",
                i,
                row.len(),
                contract.version,
                n_features
            );
        }
        if params.iterations == 0 || params.max_depth == 0 {
            bail!("iterations and max depth must both be positive");
        }
        if !(params.shrinkage > 0.0 && params.shrinkage <= 1.0) {
            bail!("shrinkage must be in (0, 1], got {}", params.shrinkage);
        }

        let mut cfg = GbdtConfig::new();
        cfg.set_feature_size(n_features);
        cfg.set_max_depth(params.max_depth);
        cfg.set_iterations(params.iterations);
        cfg.set_shrinkage(params.shrinkage);
        cfg.set_min_leaf_size(1);
        cfg.set_loss("SquaredError");

        let mut data: DataVec = rows
            .iter()
            .zip(targets)
            .map(|(row, y)| Data::new_training_data(to_f32(row), 1.0, *y as f32, None))
            .collect();

        let mut gbdt = GBDT::new(&cfg);
        gbdt.fit(&mut data);

        Ok(Self {
            contract,
            gbdt,
            params,
            training_rows: rows.len(),
            trained_at: Utc::now(),
        })
    }

    /// Load a model and its meta file, rejecting any contract drift.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        // ---
        let path = path.as_ref();
        let meta_file = meta_path(path);
        let text = fs::read_to_string(&meta_file)
            .with_context(|| format!("failed to read model meta at {}", meta_file.display()))?;
        let meta: ModelMeta = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse model meta {}", meta_file.display()))?;

        let contract = FeatureContract::by_version(&meta.contract)
            .ok_or_else(|| anyhow!("model declares unknown feature contract '{}'", meta.contract))?;
        if !contract.matches(&meta.feat_list) {
            bail!(
                "model feature order [{}] does not match contract '{}' [{}]",
                meta.feat_list.join(", "),
                contract.version,
                contract.describe()
            );
        }

        let gbdt = GBDT::load_model(path_str(path)?)
            .map_err(|e| anyhow!("failed to load model at {}: {e}", path.display()))?;

        Ok(Self {
            contract,
            gbdt,
            params: TrainParams {
                iterations: meta.iterations,
                max_depth: meta.max_depth,
                shrinkage: meta.shrinkage,
            },
            training_rows: meta.training_rows,
            trained_at: meta.trained_at,
        })
    }

    /// Write the model and its meta file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        // ---
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        self.gbdt
            .save_model(path_str(path)?)
            .map_err(|e| anyhow!("failed to write model {}: {e}", path.display()))?;

        let meta = ModelMeta {
            contract: self.contract.version.to_string(),
            feat_list: self.contract.features.iter().map(|f| f.to_string()).collect(),
            training_rows: self.training_rows,
            trained_at: self.trained_at,
            iterations: self.params.iterations,
            max_depth: self.params.max_depth,
            shrinkage: self.params.shrinkage,
        };
        let meta_file = meta_path(path);
        let text = serde_json::to_string_pretty(&meta)?;
        fs::write(&meta_file, text)
            .with_context(|| format!("failed to write {}", meta_file.display()))?;
        Ok(())
    }

    pub fn params(&self) -> TrainParams {
        self.params
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }
}

impl Estimator for BoostedModel {
    fn contract(&self) -> &'static FeatureContract {
        self.contract
    }

    fn predict(&self, features: &[f64]) -> Result<f64, EstimatorError> {
        // ---
        let expected = self.contract.features.len();
        if features.len() != expected {
            return Err(EstimatorError::ShapeMismatch {
                expected,
                got: features.len(),
            });
        }

        let input: DataVec = vec![Data::new_test_data(to_f32(features), None)];
        let value = self
            .gbdt
            .predict(&input)
            .first()
            .map(|v| f64::from(*v))
            .ok_or(EstimatorError::NonFinite)?;

        if value.is_finite() {
            Ok(value)
        } else {
            Err(EstimatorError::NonFinite)
        }
    }
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|v| *v as f32).collect()
}

// gbdt takes model paths as &str
fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("model path {} is not valid UTF-8", path.display()))
}

/// Five-row synthetic dataset for the `weather-v1` contract
/// (pm2_5, humidity, temperature → aqi on the 0..500 scale).
pub fn sample_dataset() -> (Vec<Vec<f64>>, Vec<f64>) {
    // ---
    let rows = vec![
        vec![20.0, 30.0, 20.0],
        vec![40.0, 40.0, 25.0],
        vec![60.0, 50.0, 30.0],
        vec![80.0, 60.0, 35.0],
        vec![100.0, 70.0, 40.0],
    ];
    let targets = vec![50.0, 100.0, 150.0, 200.0, 250.0];
    (rows, targets)
}

/// Parse a JSON training set: an array of objects, each holding every
/// contract feature plus the `aqi` target.
pub fn dataset_from_json(
    value: &serde_json::Value,
    contract: &FeatureContract,
) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    // ---
    let records = value
        .as_array()
        .ok_or_else(|| anyhow!("dataset must be a JSON array of objects"))?;

    let mut rows = Vec::with_capacity(records.len());
    let mut targets = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let obj = record
            .as_object()
            .ok_or_else(|| anyhow!("dataset record {i} is not an object"))?;
        let row =
            assemble_features(obj, contract).map_err(|e| anyhow!("dataset record {i}: {e}"))?;
        let target = obj
            .get("aqi")
            .and_then(|v| v.as_f64())
            .filter(|v| v.is_finite())
            .ok_or_else(|| anyhow!("dataset record {i}: missing numeric 'aqi' target"))?;
        rows.push(row);
        targets.push(target);
    }
    Ok((rows, targets))
}
