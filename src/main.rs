//! db-gateway
//!
//! HTTP gateway for database administration.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                     DB GATEWAY                       │
//!                  │                                                      │
//!   Client Request │  ┌─────────┐   ┌──────────┐   ┌─────────┐           │
//!   ───────────────┼─▶│ request │──▶│admission │──▶│ api key │──┐        │
//!                  │  │  start  │   │ (bucket) │   │  auth   │  │        │
//!                  │  └─────────┘   └────┬─────┘   └────┬────┘  │        │
//!                  │                   429│          401│       ▼        │
//!                  │                      │             │  ┌──────────┐  │
//!                  │                      │             │  │ handlers │──┼──▶ DatabaseAdmin
//!                  │                      │             │  └────┬─────┘  │    (per engine)
//!                  │                      ▼             ▼       ▼        │
//!   Response       │                 ┌───────────────────────────────┐   │
//!   ◀──────────────┼─────────────────│  envelope / ad hoc error JSON │   │
//!                  │                 └───────────────────────────────┘   │
//!                  └──────────────────────────────────────────────────────┘
//! ```
//!
//! This binary starts with no engine backends registered; programs that embed
//! the library register their `DatabaseAdmin` implementations in `Backends`
//! and call `lifecycle::startup::serve` themselves.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use db_gateway::config::load_with_env;
use db_gateway::database::Backends;
use db_gateway::lifecycle::startup;
use db_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "db-gateway")]
#[command(about = "HTTP gateway for database administration", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_with_env(Some(&args.config))?;
    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "db-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        refill_rate = config.rate_limit.refill_rate,
        burst_capacity = config.rate_limit.burst_capacity,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    startup::serve(config, Some(args.config), Backends::new()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
