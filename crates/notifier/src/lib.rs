//! Outbound notification capability.
//!
//! The core talks to a single-method [`Notifier`] trait so tests can swap in
//! a capture double without touching I/O. The shipped implementation is
//! [`WebhookNotifier`], which POSTs JSON to a webhook URL. Message bodies are
//! built by the pure formatters in [`message`].

use std::future::Future;
use std::pin::Pin;

pub mod message;
mod webhook;

pub use webhook::WebhookNotifier;

/// A boxed future returned by [`Notifier::send`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// Capability for delivering one notification.
///
/// Delivery is best-effort: there is no retry contract, and callers decide
/// what to do with a failure (the daemon logs and drops it).
pub trait Notifier: Send + Sync + 'static {
    fn send(&self, text: String) -> SendFuture<'_>;
}

/// Errors from notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    Status(reqwest::StatusCode),
}
