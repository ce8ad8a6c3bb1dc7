//! Auditum CLI
//!
//! Operator tool for the Auditum audit-trail store: schema migration,
//! project administration and record queries. Results are printed as JSON.

mod commands;
mod config;
mod output;

use clap::Parser;
use tracing::info;

use auditum_persistence::open_store;

use crate::config::CliConfig;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("auditum={},auditum_persistence={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let store_config = config.store_config()?;
    if let Err(errors) = store_config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(store = %store_config.kind, "Opening audit store");
    let store = open_store(&store_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open {} store: {}", store_config.kind, e))?;

    let output = commands::run(&config.command, store.as_ref()).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
