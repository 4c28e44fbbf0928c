//! dwd-mirror daemon
//!
//! This binary coordinates:
//! - the hourly forecast update (station overview JSON)
//! - the hourly observation update (POI CSV reports)
//! - writing changed values to the configured state store

mod cli;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use dwdx_config::AppConfig;
use dwdx_core::StateWriter;
use dwdx_ingest::{Fetcher, ForecastPipeline, HttpFetcher, ObservationPipeline};

use crate::cli::Cli;
use crate::scheduler::{parse_schedule, Scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    dwdx_obs::init("dwd-mirror", config.enable_logs, cli.json_logs);
    info!("Loaded configuration: {:?}", config);

    let fetcher: Arc<dyn Fetcher> = Arc::new(
        HttpFetcher::new(
            Duration::from_secs(config.http.timeout_secs),
            &config.http.user_agent,
        )
        .context("Failed to build HTTP client")?,
    );
    let store = dwdx_sinks::open_store(&config.store).context("Failed to open state store")?;
    let writer = StateWriter::new(store);

    let forecast = Arc::new(ForecastPipeline::new(
        config.root.clone(),
        config.forecast.clone(),
        fetcher.clone(),
        writer.clone(),
    ));
    let observations = Arc::new(ObservationPipeline::new(
        config.root.clone(),
        config.observations.clone(),
        fetcher,
        writer,
    ));

    if cli.once || config.run_on_start {
        forecast.run().await;
        observations.run().await;
    }
    if cli.once {
        return Ok(());
    }

    let forecast_schedule = parse_schedule(&config.forecast.schedule)?;
    let observation_schedule = parse_schedule(&config.observations.schedule)?;

    let mut scheduler = Scheduler::new();
    scheduler.spawn("forecast", forecast_schedule, forecast);
    scheduler.spawn("observations", observation_schedule, observations);

    info!("Daemon running - press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");
    scheduler.stop();

    info!("dwd-mirror stopped");
    Ok(())
}
