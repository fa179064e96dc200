//! Outbound notification channels.
//!
//! Every channel implements the [`Notifier`] trait; the [`Dispatcher`]
//! iterates the configured set uniformly and isolates failures per channel.
//! A channel failure is logged and recorded, never propagated - one dead
//! webhook must not silence the others.

pub mod discord;
pub mod dispatcher;
pub mod email;
pub mod slack;
pub mod webhook;

pub use discord::DiscordNotifier;
pub use dispatcher::{ChannelOutcome, Dispatcher};
pub use email::EmailNotifier;
pub use slack::SlackNotifier;
pub use webhook::GenericWebhookNotifier;

use async_trait::async_trait;
use chrono::NaiveDate;
use expiryguard_storage::{Secret, Threshold};
use thiserror::Error;

/// Notification channel error types
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{channel} returned status {status}")]
    Status { channel: &'static str, status: u16 },

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Email(#[from] lettre::error::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A due expiry notification, ready for rendering by each channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryEvent {
    pub secret_name: String,
    pub owner_email: String,
    pub expiry_date: NaiveDate,
    pub days_remaining: i64,
    pub threshold: Threshold,
}

impl ExpiryEvent {
    pub fn new(secret: &Secret, threshold: Threshold, days_remaining: i64) -> Self {
        Self {
            secret_name: secret.name.clone(),
            owner_email: secret.owner_email.clone(),
            expiry_date: secret.expiry_date,
            days_remaining,
            threshold,
        }
    }
}

/// End-of-run totals broadcast to the chat channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_candidates: usize,
    pub notifications_sent: usize,
    /// Names notified at the 3-day threshold during this run
    pub urgent_names: Vec<String>,
}

impl RunSummary {
    /// Chat-formatted summary text (Slack markdown; Discord doubles the
    /// asterisks).
    pub fn message(&self) -> String {
        let urgent_line = if self.urgent_names.is_empty() {
            "• No urgent secrets today!".to_string()
        } else {
            format!("• ⚠️ Urgent: {}", self.urgent_names.join(", "))
        };
        format!(
            "📊 *ExpiryGuard Daily Summary*\n• Secrets monitored: {}\n• Notifications sent: {}\n{}",
            self.total_candidates, self.notifications_sent, urgent_line
        )
    }
}

/// One outbound notification channel.
///
/// Implementations render the event in their own format and perform a
/// single bounded send. They never retry; delivery is best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> &'static str;

    async fn send_expiry(&self, event: &ExpiryEvent) -> Result<(), NotifyError>;

    /// Whether this channel receives the end-of-run summary broadcast.
    fn handles_summary(&self) -> bool {
        false
    }

    /// Send the run summary. Only called when `handles_summary` is true.
    async fn send_summary(&self, _summary: &RunSummary) -> Result<(), NotifyError> {
        Ok(())
    }
}
