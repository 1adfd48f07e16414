//! Ledger Node Binary
//!
//! Hosts an Akin ledger behind the single-writer actor. Apps are linked in
//! by embedding crates; this binary starts with an empty registry.

use akin_ledger::{spawn_ledger_actor, AppRegistry, Config, Ledger, Outcome};
use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Akin ledger node");

    // Load configuration
    let config = if let Ok(config_path) = std::env::var("AKIN_CONFIG") {
        info!("Loading config from: {}", config_path);
        Config::from_file(&config_path)
            .with_context(|| format!("loading config from {}", config_path))?
    } else {
        info!("Loading config from environment variables");
        Config::from_env().context("loading config from environment")?
    };

    info!(
        service = %config.service_name,
        chain_id = %config.chain_id,
        validators = ?config.validators,
        "Configuration loaded"
    );

    let ledger = Ledger::from_config(&config, AppRegistry::new())?;
    let handle = spawn_ledger_actor(ledger, config.actor.mailbox_capacity);

    info!(
        "Ledger node running (mailbox capacity {})",
        config.actor.mailbox_capacity
    );

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    // Graceful shutdown
    let blocks = handle.blocks().await?;
    let verification = Outcome::verification(&handle.is_valid_chain().await);
    info!(height = blocks.len().saturating_sub(1), valid = %verification, "Final chain state");

    handle.shutdown().await?;
    info!("Ledger node stopped");
    Ok(())
}
