//! Discord-style webhook channel.

use async_trait::async_trait;
use serde_json::json;

use super::{ExpiryEvent, Notifier, NotifyError, RunSummary};

pub struct DiscordNotifier {
    url: String,
    client: reqwest::Client,
}

impl DiscordNotifier {
    pub fn new(url: String, client: reqwest::Client) -> Self {
        Self { url, client }
    }

    async fn post(&self, content: String) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "content": content }))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status {
                channel: "discord",
                status: response.status().as_u16(),
            })
        }
    }
}

fn expiry_content(event: &ExpiryEvent) -> String {
    format!(
        "{} **[{}]** Secret **{}** expires in **{} days** ({})\nOwner: {}",
        event.threshold.emoji(),
        event.threshold.label(),
        event.secret_name,
        event.days_remaining,
        event.expiry_date,
        event.owner_email
    )
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn channel(&self) -> &'static str {
        "discord"
    }

    async fn send_expiry(&self, event: &ExpiryEvent) -> Result<(), NotifyError> {
        self.post(expiry_content(event)).await
    }

    fn handles_summary(&self) -> bool {
        true
    }

    async fn send_summary(&self, summary: &RunSummary) -> Result<(), NotifyError> {
        // Discord bolds with ** where Slack uses a single *
        self.post(summary.message().replace('*', "**")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use expiryguard_storage::Threshold;

    #[test]
    fn test_expiry_content_uses_double_asterisks() {
        let event = ExpiryEvent {
            secret_name: "license-key".to_string(),
            owner_email: "ops@example.com".to_string(),
            expiry_date: NaiveDate::from_ymd_opt(2026, 8, 8).unwrap(),
            days_remaining: 3,
            threshold: Threshold::Urgent,
        };
        let content = expiry_content(&event);
        assert!(content.starts_with("🚨 **[URGENT]**"));
        assert!(content.contains("**license-key**"));
        assert!(content.contains("**3 days**"));
    }

    #[test]
    fn test_summary_bold_rewrite() {
        let summary = RunSummary {
            total_candidates: 3,
            notifications_sent: 1,
            urgent_names: vec![],
        };
        let rewritten = summary.message().replace('*', "**");
        assert!(rewritten.contains("**ExpiryGuard Daily Summary**"));
    }
}
