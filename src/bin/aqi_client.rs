//! Terminal client for the air quality backend.
//!
//! Mirrors what the dashboard does: current AQI with its category label,
//! the 7-day history, and a prediction whose payload is built from the
//! same feature contract the server enforces.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

use airquality::{AqiCategory, FeatureContract};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "aqi-client", version, about = "Air quality dashboard client")]
struct Cli {
    /// Backend base URL.
    #[arg(long, env = "AQI_BACKEND_URL", default_value = "http://localhost:5000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the current AQI for a city or coordinate.
    Current {
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Show daily AQI history, oldest first.
    History {
        #[arg(long, default_value = "Delhi")]
        city: String,

        #[arg(long)]
        days: Option<u32>,
    },

    /// Ask the model for an AQI estimate.
    Predict {
        /// Feature contract the payload is built for.
        #[arg(long, default_value = "weather-v1")]
        contract: String,

        /// Feature value as `name=value`; repeat for every contract feature.
        #[arg(long = "feature", value_parser = parse_feature)]
        features: Vec<(String, f64)>,
    },
}

#[derive(Debug, Deserialize)]
struct AqiBody {
    lat: f64,
    lon: f64,
    aqi: Option<i64>,
    #[serde(default)]
    components: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    date: String,
    aqi: i64,
}

#[derive(Debug, Deserialize)]
struct PredictionBody {
    prediction: f64,
    scale: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    let cli = Cli::parse();
    let http = Client::new();
    let base = cli.base_url.trim_end_matches('/');

    match cli.command {
        Command::Current { city, lat, lon } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            match (city, lat, lon) {
                (Some(city), _, _) => query.push(("city", city)),
                (None, Some(lat), Some(lon)) => {
                    query.push(("lat", lat.to_string()));
                    query.push(("lon", lon.to_string()));
                }
                _ => bail!("pass --city or both --lat and --lon"),
            }

            let res = http.get(format!("{base}/api/aqi")).query(&query).send().await?;
            let body: AqiBody = read_json(res).await?;

            let label = body
                .aqi
                .and_then(AqiCategory::from_index)
                .map(|a| a.label())
                .unwrap_or("Unknown");
            println!("Location : {:.4}, {:.4}", body.lat, body.lon);
            match body.aqi {
                Some(aqi) => println!("AQI      : {aqi} ({label})"),
                None => println!("AQI      : N/A"),
            }
            println!("Pollutants (μg/m³):");
            let mut components: Vec<_> = body.components.into_iter().collect();
            components.sort_by(|a, b| a.0.cmp(&b.0));
            for (name, value) in components {
                println!("  {name:<6} {value:>9.2}");
            }
        }
        Command::History { city, days } => {
            let mut query = vec![("city", city.clone())];
            if let Some(days) = days {
                query.push(("days", days.to_string()));
            }

            let res = http.get(format!("{base}/api/history")).query(&query).send().await?;
            let points: Vec<HistoryBody> = read_json(res).await?;

            if points.is_empty() {
                println!("No historical data available for {city}.");
            }
            for p in points {
                let label = AqiCategory::from_index(p.aqi).map_or("Unknown", |a| a.label());
                let bar = "#".repeat(p.aqi.clamp(0, 5) as usize * 4);
                println!("{}  {} {:<20} {}", p.date, p.aqi, bar, label);
            }
        }
        Command::Predict { contract, features } => {
            let contract = FeatureContract::by_version(&contract)
                .ok_or_else(|| anyhow!("unknown feature contract '{contract}'"))?;
            let values: HashMap<String, f64> = features.into_iter().collect();
            let payload = contract.build_payload(&values)?;

            let res = http
                .post(format!("{base}/api/predict"))
                .json(&payload)
                .send()
                .await?;
            let body: PredictionBody = read_json(res).await?;
            println!("Predicted AQI: {:.2} ({})", body.prediction, body.scale);
        }
    }

    Ok(())
}

/// Decode a success body, or surface the backend's `error` message.
async fn read_json<T: serde::de::DeserializeOwned>(res: Response) -> Result<T> {
    // ---
    let status = res.status();
    let body: Value = res.json().await.context("backend returned a non-JSON body")?;
    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("no error message");
        bail!("backend returned {status}: {message}");
    }
    serde_json::from_value(body).context("unexpected response shape")
}

fn parse_feature(raw: &str) -> Result<(String, f64), String> {
    // ---
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    Ok((name.trim().to_string(), value))
}
