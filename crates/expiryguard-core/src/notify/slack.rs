//! Slack-style webhook channel.

use async_trait::async_trait;
use serde_json::json;

use super::{ExpiryEvent, Notifier, NotifyError, RunSummary};

pub struct SlackNotifier {
    url: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(url: String, client: reqwest::Client) -> Self {
        Self { url, client }
    }

    async fn post(&self, text: String) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text, "mrkdwn": true }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status {
                channel: "slack",
                status: response.status().as_u16(),
            })
        }
    }
}

fn expiry_text(event: &ExpiryEvent) -> String {
    format!(
        "{} *[{}]* Secret *{}* expires in *{} days* ({})\nOwner: {}",
        event.threshold.emoji(),
        event.threshold.label(),
        event.secret_name,
        event.days_remaining,
        event.expiry_date,
        event.owner_email
    )
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn channel(&self) -> &'static str {
        "slack"
    }

    async fn send_expiry(&self, event: &ExpiryEvent) -> Result<(), NotifyError> {
        self.post(expiry_text(event)).await
    }

    fn handles_summary(&self) -> bool {
        true
    }

    async fn send_summary(&self, summary: &RunSummary) -> Result<(), NotifyError> {
        self.post(summary.message()).await
    }
}
