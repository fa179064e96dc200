//! Generic webhook channel - structured JSON for machine consumers.

use async_trait::async_trait;
use serde::Serialize;

use super::{ExpiryEvent, Notifier, NotifyError};

const EVENT_KIND: &str = "secret_expiry_warning";

pub struct GenericWebhookNotifier {
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ExpiryPayload<'a> {
    event: &'static str,
    secret_name: &'a str,
    /// ISO date string
    expiry_date: String,
    days_remaining: i64,
    /// Day count of the crossed threshold (3, 7 or 30)
    threshold: i64,
    urgency: &'static str,
    owner_email: &'a str,
    /// ISO-8601 instant the notification was produced
    timestamp: String,
}

impl GenericWebhookNotifier {
    pub fn new(url: String, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

fn payload(event: &ExpiryEvent) -> ExpiryPayload<'_> {
    ExpiryPayload {
        event: EVENT_KIND,
        secret_name: &event.secret_name,
        expiry_date: event.expiry_date.to_string(),
        days_remaining: event.days_remaining,
        threshold: event.threshold.days(),
        urgency: event.threshold.label(),
        owner_email: &event.owner_email,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

#[async_trait]
impl Notifier for GenericWebhookNotifier {
    fn channel(&self) -> &'static str {
        "webhook"
    }

    // Summaries stay on the chat channels; this endpoint only receives
    // per-secret events.
    async fn send_expiry(&self, event: &ExpiryEvent) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&payload(event))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status {
                channel: "webhook",
                status: response.status().as_u16(),
            })
        }
    }
}
