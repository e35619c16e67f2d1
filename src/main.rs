//! unisport-gateway - periodic scraper of the Unisport populartimes page
//!
//! Fetches per-location occupancy, capacity, and opening hours on a
//! fixed interval and keeps the latest snapshot in memory for
//! home-automation consumers.
//!
//! Module structure:
//! - `domain/` - Core business types (Location, OpeningHour, OccupancySnapshot)
//! - `io/` - External interfaces (HTTP client, page parser)
//! - `services/` - Business logic (RefreshCoordinator)
//! - `infra/` - Infrastructure (Config)

use clap::Parser;
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use unisport_gateway::infra::Config;
use unisport_gateway::io::ApiClient;
use unisport_gateway::services::RefreshCoordinator;

/// Unisport gym occupancy gateway
#[derive(Parser, Debug)]
#[command(name = "unisport-gateway", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = env!("GIT_HASH"), "unisport-gateway starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        source_url = %config.source_url(),
        timeout_secs = %config.request_timeout().as_secs(),
        refresh_interval_secs = %config.refresh_interval().as_secs(),
        timezone = %config.timezone(),
        "config_loaded"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let client = Arc::new(ApiClient::new(config.source_url(), config.request_timeout())?);
    let coordinator = Arc::new(RefreshCoordinator::new(client, config.refresh_interval()));

    // Startup refresh: block until the first fetch resolves (success or
    // failure) so readers start from a known state, then go periodic.
    if let Err(kind) = coordinator.refresh().await {
        warn!(kind = kind.as_str(), "startup_refresh_failed");
    }

    let refresh_coordinator = coordinator.clone();
    let refresh_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        refresh_coordinator.run(refresh_shutdown).await;
    });

    // Periodic occupancy report - the in-process stand-in for a
    // presentation adapter reading the snapshot
    let report_coordinator = coordinator.clone();
    let timezone = config.timezone();
    let report_interval = config.report_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(report_interval);
        loop {
            interval.tick().await;
            report_occupancy(&report_coordinator, timezone);
        }
    });

    // Handle shutdown on Ctrl+C
    tokio::signal::ctrl_c().await.ok();
    info!("shutdown_signal_received");
    let _ = shutdown_tx.send(true);

    info!("unisport-gateway shutdown complete");
    Ok(())
}

fn report_occupancy(coordinator: &RefreshCoordinator, timezone: Tz) {
    let Some(state) = coordinator.current_snapshot() else {
        warn!(last_error = ?coordinator.last_error(), "no_snapshot_available");
        return;
    };

    for location in state.snapshot.locations.values() {
        let open_state = match location.is_open_now(timezone) {
            Some(true) => "open",
            Some(false) => "closed",
            None => "unknown",
        };
        info!(
            location_id = location.location_id,
            name = %location.name,
            visitors = state.snapshot.visitor_count(location.location_id),
            max_capacity = location.max_capacity,
            open = open_state,
            stale = state.stale,
            "occupancy"
        );
    }
}
