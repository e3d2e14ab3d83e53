//! Intercept Agent Binary Entry Point

use clap::Parser;
use intercept_agent::{run_agent, Args};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    tokio::select! {
        result = run_agent(args) => {
            if let Err(e) = result {
                tracing::error!("Intercept agent failed: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
             tracing::info!("Shutdown signal received, stopping intercepting proxy...");
        }
    }

    Ok(())
}
