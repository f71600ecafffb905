//! KaleWatch - KALE price telemetry daemon
//!
//! Polls the configured feed, keeps the recent history in memory and logs a
//! periodic summary. With the `dashboard` feature the same telemetry is served
//! as JSON.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use kalewatch::config::AppConfig;
use kalewatch::oracle::sources::build_feed;
use kalewatch::oracle::AcquisitionLoop;
use kalewatch::persistence::{load_time_range, JsonFilePreferences, PreferenceStore};
use kalewatch::report::run_summary_logger;

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Config & logging ──────────────────────────────────────────────
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(config.logging.json);

    info!("🥬 KaleWatch starting");
    info!(config = %config, "Configuration loaded");

    // ── 2. Feed + acquisition loop ───────────────────────────────────────
    let feed = build_feed(&config.feed)?;
    info!(feed = feed.name(), "Feed adapter ready");

    let (acquisition, telemetry) = AcquisitionLoop::from_config(feed, &config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let acquisition_task = tokio::spawn(acquisition.run(shutdown_rx.clone()));

    // ── 3. Consumers ─────────────────────────────────────────────────────
    let preferences: Arc<dyn PreferenceStore> =
        Arc::new(JsonFilePreferences::new(&config.preferences.path));
    info!(
        range = %load_time_range(preferences.as_ref()),
        path = %config.preferences.path,
        "Chart range preference"
    );

    let summary_task = tokio::spawn(run_summary_logger(
        telemetry.clone(),
        preferences.clone(),
        std::time::Duration::from_secs(config.logging.summary_interval_secs),
        shutdown_rx.clone(),
    ));

    #[cfg(feature = "dashboard")]
    {
        if config.dashboard.enabled {
            let state = kalewatch::dashboard::DashboardState::new(
                telemetry.clone(),
                preferences.clone(),
            );
            let port = config.dashboard.port;
            tokio::spawn(async move {
                if let Err(e) = kalewatch::dashboard::start_server(state, port).await {
                    error!(error = %e, "Dashboard server failed");
                }
            });
        }
    }
    #[cfg(not(feature = "dashboard"))]
    {
        if config.dashboard.enabled {
            warn!("dashboard.enabled is set but the binary was built without the `dashboard` feature");
        }
    }

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 4. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    warn!("Shutdown signal received, stopping");

    let _ = shutdown_tx.send(true);
    if let Err(e) = acquisition_task.await {
        error!(error = %e, "Acquisition task ended abnormally");
    }
    let _ = summary_task.await;

    let snapshot = telemetry.snapshot();
    info!(
        samples = snapshot.history.len(),
        connected = snapshot.connectivity.is_connected(),
        "KaleWatch shut down complete"
    );
    Ok(())
}
