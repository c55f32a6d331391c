//! Playhead simulator (vista-ph) - Main entry point
//!
//! Runs the playhead controller against a simulated media element, timeline
//! and segment pipeline described by the `[scenario]` table of the config
//! file, then prints a summary of where playback ended up.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vista_common::events::{EventBus, PlayheadEvent};
use vista_common::time::secs_to_duration;
use vista_ph::config::{TomlConfig, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
use vista_ph::observer::EventBusObserver;
use vista_ph::sim::driver::PlayheadDriver;
use vista_ph::sim::Simulation;

/// Command-line arguments for vista-ph
#[derive(Parser, Debug)]
#[command(name = "vista-ph")]
#[command(about = "Playhead controller simulator for Vista")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Override the scenario run time (seconds)
    #[arg(short, long)]
    duration_secs: Option<f64>,

    /// Override the requested playback rate
    #[arg(short, long, allow_hyphen_values = true)]
    rate: Option<f64>,

    /// Override the start position (seconds)
    #[arg(short, long)]
    start_time: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = vista_common::config::resolve_config_path(
        args.config.as_deref(),
        CONFIG_ENV_VAR,
        CONFIG_FILE_NAME,
    );
    let mut config =
        TomlConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    let default_filter = format!("vista_ph={0},vista_common={0}", config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting vista-ph {} ({} build, {})",
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    if let Some(rate) = args.rate {
        config.scenario.playback_rate = rate;
    }
    if let Some(start_time) = args.start_time {
        config.scenario.start_time = Some(start_time);
    }
    let run_secs = args.duration_secs.unwrap_or(config.scenario.run_secs);
    if !(run_secs >= 0.0) || !run_secs.is_finite() {
        anyhow::bail!("run time must be a finite non-negative number, got {}", run_secs);
    }

    let bus = EventBus::new(100);
    let logger = tokio::spawn(log_events(bus.subscribe()));

    let observer = EventBusObserver::new(bus, config.scenario.cancel_large_gaps);
    let scenario = config.scenario.clone();
    let playhead_config = config.playhead.clone();
    let (driver, handle) = PlayheadDriver::new(move |timers| {
        Simulation::new(&scenario, playhead_config, timers, Box::new(observer))
    })
    .context("Failed to set up simulation")?;

    tokio::spawn(async move {
        shutdown_signal().await;
        if handle.shutdown().is_err() {
            warn!("Driver already stopped");
        }
    });

    let report = driver
        .run(secs_to_duration(run_secs))
        .await
        .context("Simulation failed")?;

    // The observer (and with it the last bus sender) was dropped with the
    // simulation, so the logger drains and exits
    let tally = logger.await.context("Event logger task failed")?;

    info!("Simulation complete: {}", report);
    println!(
        "{} seeks_accepted={} large_gaps={}",
        report, tally.seeks_accepted, tally.large_gaps
    );
    Ok(())
}

/// Counts of the events seen by [`log_events`]
#[derive(Debug, Default)]
struct EventTally {
    seeks_accepted: usize,
    large_gaps: usize,
}

/// Log every playhead event published on the bus until the bus closes
async fn log_events(mut rx: broadcast::Receiver<PlayheadEvent>) -> EventTally {
    let mut tally = EventTally::default();
    loop {
        match rx.recv().await {
            Ok(event) => {
                match &event {
                    PlayheadEvent::SeekAccepted { .. } => tally.seeks_accepted += 1,
                    PlayheadEvent::LargeGap { .. } => tally.large_gaps += 1,
                }
                match event.to_json() {
                    Ok(json) => info!("Playhead event: {}", json),
                    Err(e) => warn!("Unserializable {} event: {}", event.event_type(), e),
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event logger lagged, {} events skipped", skipped)
            }
            Err(RecvError::Closed) => break,
        }
    }
    tally
}

/// Resolves on Ctrl+C (or SIGTERM on Unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
