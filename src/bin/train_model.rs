//! Trains the AQI estimator and writes the model file the server loads.
//!
//! Without `--data` the built-in five-row sample set is used, which only
//! covers the `weather-v1` contract.

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use airquality::contract::WEATHER_V1;
use airquality::estimator::{
    dataset_from_json, meta_path, sample_dataset, DEFAULT_ITERATIONS, DEFAULT_MAX_DEPTH,
    DEFAULT_SHRINKAGE,
};
use airquality::{BoostedModel, Estimator, FeatureContract, TrainParams};

#[derive(Debug, Parser)]
#[command(name = "train-model", version, about = "Train the AQI regression model")]
struct Args {
    /// Feature contract to train against.
    #[arg(long, default_value = "weather-v1")]
    contract: String,

    /// JSON dataset: array of objects with every contract feature plus `aqi`.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Where to write the model. The meta file lands beside it.
    #[arg(long, default_value = "model/model.gbdt")]
    output: PathBuf,

    /// Boosting rounds.
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,

    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u32,

    /// Learning rate applied to each tree.
    #[arg(long, default_value_t = DEFAULT_SHRINKAGE)]
    shrinkage: f32,
}

fn main() -> Result<()> {
    // ---
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let contract = FeatureContract::by_version(&args.contract)
        .with_context(|| format!("unknown feature contract '{}'", args.contract))?;

    let (rows, targets) = match &args.data {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read dataset {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse dataset {}", path.display()))?;
            dataset_from_json(&value, contract)?
        }
        None if contract == &WEATHER_V1 => sample_dataset(),
        None => bail!(
            "contract '{}' has no built-in sample data; pass --data",
            contract.version
        ),
    };

    tracing::info!(
        "Training on {} rows for contract {} [{}]",
        rows.len(),
        contract.version,
        contract.describe()
    );
    let params = TrainParams {
        iterations: args.iterations,
        max_depth: args.max_depth,
        shrinkage: args.shrinkage,
    };
    let model = BoostedModel::fit(contract, &rows, &targets, params)?;

    let mse = rows
        .iter()
        .zip(&targets)
        .map(|(row, y)| model.predict(row).map(|p| (p - y).powi(2)))
        .sum::<Result<f64, _>>()?
        / rows.len() as f64;
    tracing::info!("Training RMSE: {:.3}", mse.sqrt());

    model.save(&args.output)?;
    tracing::info!(
        "Model saved at {} (meta {})",
        args.output.display(),
        meta_path(&args.output).display()
    );
    Ok(())
}
