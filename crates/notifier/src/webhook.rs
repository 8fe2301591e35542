//! Webhook delivery over HTTP.

use serde::Serialize;

use crate::{Notifier, NotifyError, SendFuture};

#[derive(Serialize)]
struct Payload<'a> {
    content: &'a str,
}

/// Sends notifications as a JSON `{"content": …}` POST to a webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

impl Notifier for WebhookNotifier {
    fn send(&self, text: String) -> SendFuture<'_> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.url)
                .json(&Payload { content: &text })
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(NotifyError::Status(status));
            }

            tracing::debug!(status = status.as_u16(), "notification delivered");
            Ok(())
        })
    }
}
