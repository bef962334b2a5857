//! Application entry point for the `codemetal-airquality` backend service.
//!
//! This binary orchestrates the full startup sequence for the air quality
//! API, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the shared HTTP client and the upstream providers
//! - Loading the trained estimator and checking its feature contract
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `OPENWEATHER_API_KEY` (**required**) – air pollution API key
//! - `PORT` (optional) – listening port (default: 5000)
//! - `MODEL_PATH` (optional) – trained model file (default: `model/model.gbdt`)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See `config.rs` for the remaining upstream settings.
use std::{env, net::SocketAddr, path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use airquality::{
    config, router, AppState, BoostedModel, Config, Estimator, LocationResolver,
    NominatimGeocoder, OpenWeatherProvider, PollutionClient, PredictionAdapter,
};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.upstream_timeout_secs))
        .user_agent(cfg.user_agent.as_str())
        .build()
        .context("Failed to build HTTP client")?;

    let geocoder = NominatimGeocoder::new(http.clone(), cfg.geocoder_url.as_str());
    let provider = OpenWeatherProvider::new(
        http,
        cfg.openweather_url.as_str(),
        cfg.openweather_api_key.as_str(),
    );

    let predictor = load_predictor(&cfg)?;

    let port = cfg.port;
    let state = AppState {
        config: Arc::new(cfg),
        resolver: Arc::new(LocationResolver::new(Arc::new(geocoder))),
        pollution: Arc::new(PollutionClient::new(Arc::new(provider))),
        predictor,
    };

    // Build app from routes gateway (EMBP)
    let app: Router = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Load the estimator named by `MODEL_PATH`.
///
/// A missing model file leaves prediction disabled (the endpoint answers
/// 503). A model that exists but disagrees with `FEATURE_CONTRACT` aborts
/// startup.
fn load_predictor(cfg: &Config) -> Result<Option<Arc<PredictionAdapter>>> {
    // ---
    if !Path::new(&cfg.model_path).exists() {
        tracing::warn!(
            "Model file {} not found; /api/predict will answer 503. Run `train-model` to create it.",
            cfg.model_path
        );
        return Ok(None);
    }

    let model = BoostedModel::load(&cfg.model_path)?;
    tracing::info!(
        "Loaded model from {} (contract {}, {} training rows, trained {})",
        cfg.model_path,
        model.contract().version,
        model.training_rows(),
        model.trained_at()
    );

    let adapter = PredictionAdapter::new(Arc::new(model), cfg.feature_contract)
        .with_context(|| format!("Model at {} rejected", cfg.model_path))?;
    Ok(Some(Arc::new(adapter)))
}

/// Install the compact `tracing` subscriber used by the server.
///
/// Every handler runs inside an `#[instrument]` span that carries a fresh
/// `request_id`, so the span events chosen here decide how much per-request
/// timing shows up:
/// - `AXUM_SPAN_EVENTS=full` logs enter, exit and close for each request span
/// - `AXUM_SPAN_EVENTS=enter_exit` logs enter and exit only
/// - otherwise a single close line with the request's busy/idle time
///
/// `RUST_LOG` wins when set. Otherwise `AXUM_LOG_LEVEL` picks the level for
/// this crate (default `debug`) while hyper stays at `warn` and reqwest at
/// `info`, which keeps the upstream OpenWeather and Nominatim calls visible
/// without connection-pool noise. `FORCE_COLOR` overrides TTY detection.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1" | "true" | "yes") => true,
        Ok("0" | "false" | "no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = match env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => {
            let level = env::var("AXUM_LOG_LEVEL")
                .ok()
                .and_then(|l| l.parse::<Level>().ok())
                .unwrap_or(Level::DEBUG);
            let level = level.as_str().to_ascii_lowercase();
            EnvFilter::new(format!("{level},hyper=warn,reqwest=info"))
        }
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
