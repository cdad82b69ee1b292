//! # fluxd
//!
//! ZelFlux gossip node.
//!
//! ## Startup Sequence
//!
//! 1. Parse command line, initialise logging
//! 2. Load configuration (file, then environment)
//! 3. Build the gossip services
//! 4. Listen and start discovery
//! 5. Run until Ctrl+C, then shut down gracefully

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::{NodeConfig, NodeRuntime, ServiceContainer};

/// ZelFlux gossip node.
#[derive(Debug, Parser)]
#[command(name = "fluxd", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "FLUX_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  fluxd v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let config = NodeConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let container = ServiceContainer::new(config).context("building gossip services")?;
    let runtime = NodeRuntime::start(container)
        .await
        .context("starting API listener")?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
