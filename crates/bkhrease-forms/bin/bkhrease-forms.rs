//! B.Khrease forms service binary entry point.
//!
//! Thin wrapper around the bkhrease-forms library: parses configuration,
//! initializes logging and runs the server.

use anyhow::Result;
use bkhrease_forms::{FormsConfig, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = FormsConfig::from_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        "Configuration loaded: bind={}, forward={}",
        config.bind,
        config.forward
    );

    config.validate()?;

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}
