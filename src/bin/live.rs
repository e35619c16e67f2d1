//! One-shot fetch of the populartimes page for manual verification
//!
//! Performs a single fetch/parse against the live endpoint and prints
//! each location with its current visitor count and open state. Not
//! part of the service control path.
//!
//! Usage:
//!   cargo run --bin live
//!   cargo run --bin live -- --config config/dev.toml

use clap::Parser;
use unisport_gateway::infra::Config;
use unisport_gateway::io::ApiClient;

#[derive(Parser, Debug)]
#[command(name = "live", about = "Single fetch of the populartimes page")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "config/dev.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    let client = ApiClient::new(config.source_url(), config.request_timeout())?;
    let snapshot = client.fetch_snapshot().await?;

    let mut locations: Vec<_> = snapshot.locations.values().collect();
    locations.sort_by_key(|location| location.location_id);

    for location in locations {
        let open_state = match location.is_open_now(config.timezone()) {
            Some(true) => "open",
            Some(false) => "closed",
            None => "unknown",
        };
        println!(
            "{:>4}  {:<40} {:>3}/{:<3} [{}]",
            location.location_id,
            location.name,
            snapshot.visitor_count(location.location_id),
            location.max_capacity,
            open_state
        );
    }

    Ok(())
}
