//! Daemon configuration from the environment.
//!
//! - `LOG_FILE`: path of the server log to tail (required)
//! - `WEBHOOK_URL`: webhook endpoint for notifications (required)
//! - `HEALTH_INTERVAL`: status report interval, humantime format (default `5m`)
//!
//! Values coming through docker-compose env files may be wrapped in quotes;
//! they are trimmed before use. Log verbosity is controlled separately via
//! `RUST_LOG`.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Validated daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_file: PathBuf,
    pub webhook_url: String,
    pub health_interval: Duration,
}

impl Config {
    /// Reads and validates the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let log_file = required("LOG_FILE")?;
        let webhook_url = required("WEBHOOK_URL")?;
        let health_interval = match env_trimmed("HEALTH_INTERVAL") {
            Some(raw) => parse_interval(&raw)?,
            None => DEFAULT_HEALTH_INTERVAL,
        };

        Ok(Self {
            log_file: PathBuf::from(log_file),
            webhook_url,
            health_interval,
        })
    }

    /// Webhook URL reduced to scheme and host, safe for startup logs (the
    /// path embeds the webhook token).
    pub fn webhook_host(&self) -> String {
        match self.webhook_url.split_once("://") {
            Some((scheme, rest)) => {
                let host = rest.split('/').next().unwrap_or(rest);
                format!("{scheme}://{host}")
            }
            None => self.webhook_url.clone(),
        }
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env_trimmed(key).ok_or_else(|| anyhow::anyhow!("environment variable {key} must be set"))
}

fn env_trimmed(key: &str) -> Option<String> {
    let raw = std::env::var(key).ok()?;
    let value = trim_value(&raw);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn trim_value(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}

fn parse_interval(raw: &str) -> anyhow::Result<Duration> {
    humantime::parse_duration(raw)
        .map_err(|e| anyhow::anyhow!("invalid HEALTH_INTERVAL {raw:?}: {e}"))
}
