//! Periodic server status reporter.
//!
//! On a fixed interval, reads the presence snapshot and sends a status
//! message through the notifier. Delivery failures are logged and dropped;
//! the next tick sends a fresh report anyway.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use joinwatch_notifier::{Notifier, message};
use joinwatch_presence::PresenceStore;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Sends a status report on every interval tick until cancelled.
pub struct HealthReporter<N> {
    interval: Duration,
    presence: Arc<PresenceStore>,
    notifier: Arc<N>,
    cancel: CancellationToken,
}

impl<N: Notifier> HealthReporter<N> {
    pub fn new(
        interval: Duration,
        presence: Arc<PresenceStore>,
        notifier: Arc<N>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            interval,
            presence,
            notifier,
            cancel,
        }
    }

    /// Runs the report loop. The first report fires one full interval after
    /// start.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // Skip immediate first tick.

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {
                    let names = self.presence.snapshot().await;
                    let text = message::status_message(&names, Local::now());
                    if let Err(e) = self.notifier.send(text).await {
                        tracing::error!("health report failed: {e}");
                    }
                }
            }
        }

        tracing::info!("health reporter stopped");
    }
}
