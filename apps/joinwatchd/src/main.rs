//! joinwatch daemon entry point.

mod app;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting joinwatch");

    // Load configuration; missing required variables are fatal.
    let config = config::Config::from_env()?;
    tracing::info!(
        log_file = %config.log_file.display(),
        webhook = %config.webhook_host(),
        health_interval = %humantime::format_duration(config.health_interval),
        "configuration loaded"
    );

    // Build and run the tokio runtime.
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(config))?;

    tracing::info!("joinwatch shut down cleanly");
    Ok(())
}
