// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Command-line sensor logger.
//!
//! Connects to the logger endpoint, pushes simulated readings until Ctrl+C
//! (or until `--duration-secs` elapses), then leaves the channel and exits.

use anyhow::{bail, Context, Result};
use clap::Parser;
use sensorlog::{LoggerConfig, ReadingEmitter};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sensorlog", version, about = "Push simulated sensor readings to a logger channel")]
struct Cli {
    /// TOML config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    endpoint: Option<String>,

    /// Logger identity, also used for the topic `loggers:<id>`
    #[arg(long)]
    id: Option<String>,

    /// Sensor id; repeat for several sensors
    #[arg(long = "sensor")]
    sensors: Vec<String>,

    #[arg(long)]
    delay_ms: Option<u64>,

    #[arg(long, env = "SENSORLOG_PASSWORD", hide_env_values = true)]
    password: String,

    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[arg(long)]
    duration_secs: Option<u64>,
}

impl Cli {
    fn logger_config(&self) -> Result<LoggerConfig> {
        let mut config = match (&self.config, &self.id) {
            (Some(path), _) => LoggerConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            (None, Some(id)) => LoggerConfig::new(id.clone(), self.sensors.clone()),
            (None, None) => bail!("either --config or --id is required"),
        };

        if let Some(id) = &self.id {
            config.id.clone_from(id);
        }
        if !self.sensors.is_empty() {
            config.sensor_ids.clone_from(&self.sensors);
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        Ok(config)
    }
}

async fn shutdown_signal(duration: Option<Duration>) {
    match duration {
        Some(duration) => sleep(duration).await,
        None => {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.logger_config()?;

    let mut emitter = ReadingEmitter::from_config(&config);
    emitter
        .connect(&cli.password)
        .await
        .with_context(|| format!("connecting to {}", config.endpoint))?;
    emitter.start().await.context("starting logger")?;

    shutdown_signal(cli.duration_secs.map(Duration::from_secs)).await;
    info!("shutting down");

    emitter.disconnect().await.context("stopping logger")?;
    info!(batches = emitter.batches_sent(), "logger exited");
    Ok(())
}
