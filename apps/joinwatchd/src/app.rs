//! Application orchestrator — wires the watch loop, presence store, health
//! reporter, and webhook notifier together.

use std::sync::Arc;

use joinwatch_health::HealthReporter;
use joinwatch_log_watch::WatchLoop;
use joinwatch_notifier::WebhookNotifier;
use joinwatch_presence::PresenceStore;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Runs the daemon until shutdown is requested or the watch loop fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let presence = Arc::new(PresenceStore::load(joinwatch_presence::default_store_path())?);
    let notifier = Arc::new(WebhookNotifier::new(config.webhook_url.clone()));

    // -- Health reporter --
    let reporter = HealthReporter::new(
        config.health_interval,
        Arc::clone(&presence),
        Arc::clone(&notifier),
        cancel.clone(),
    );
    let reporter_handle = tokio::spawn(reporter.run());

    // -- Watch loop --
    let watch = WatchLoop::new(config.log_file.clone(), presence, notifier, cancel.clone());
    let mut watch_handle = tokio::spawn(watch.run());

    tracing::info!("joinwatch ready");

    // A watch loop error is fatal; ctrl-c cancels both tasks and waits for
    // them to wind down.
    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, shutting down");
            cancel.cancel();
            (&mut watch_handle).await?
        }
        res = &mut watch_handle => {
            cancel.cancel();
            res?
        }
    };

    let _ = reporter_handle.await;
    result.map_err(Into::into)
}
