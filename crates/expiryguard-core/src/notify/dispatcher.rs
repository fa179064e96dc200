//! Notification fan-out with per-channel failure isolation.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, error};

use super::{
    DiscordNotifier, EmailNotifier, ExpiryEvent, GenericWebhookNotifier, Notifier, NotifyError,
    RunSummary, SlackNotifier,
};
use crate::config::Config;

/// Result of one send attempt on one channel
#[derive(Debug)]
pub struct ChannelOutcome {
    pub channel: &'static str,
    pub result: Result<(), NotifyError>,
}

impl ChannelOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Fans a due notification out to every configured channel.
///
/// Channels are independent: a send failure is logged and recorded in the
/// outcome list but never interrupts the remaining channels, and `dispatch`
/// itself never fails. Whether any channel delivered does not gate the
/// caller's state commit - delivery is best-effort by design.
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    /// Assemble the channel set from configuration.
    ///
    /// A channel with no target configured is silently absent. Email is
    /// gated only by its own config, independent of the webhook flag.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut channels: Vec<Box<dyn Notifier>> = Vec::new();

        if let Some(email) = EmailNotifier::from_config(&config.email)? {
            channels.push(Box::new(email));
        }

        if config.webhook.enabled {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.webhook.timeout_seconds))
                .build()?;

            if let Some(url) = &config.webhook.slack_url {
                channels.push(Box::new(SlackNotifier::new(url.clone(), client.clone())));
            }
            if let Some(url) = &config.webhook.discord_url {
                channels.push(Box::new(DiscordNotifier::new(url.clone(), client.clone())));
            }
            if let Some(url) = &config.webhook.generic_url {
                channels.push(Box::new(GenericWebhookNotifier::new(
                    url.clone(),
                    client.clone(),
                )));
            }
        }

        Ok(Self { channels })
    }

    /// Build a dispatcher from an explicit channel list.
    pub fn with_channels(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Whether any summary-capable channel is configured.
    pub fn is_summary_configured(&self) -> bool {
        self.channels.iter().any(|c| c.handles_summary())
    }

    /// Send an expiry notification to every configured channel.
    pub async fn dispatch(&self, event: &ExpiryEvent) -> Vec<ChannelOutcome> {
        let mut outcomes = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let result = channel.send_expiry(event).await;
            match &result {
                Ok(()) => debug!(
                    channel = channel.channel(),
                    secret = %event.secret_name,
                    "Notification sent"
                ),
                Err(e) => error!(
                    channel = channel.channel(),
                    secret = %event.secret_name,
                    error = %e,
                    "Failed to send expiry notification"
                ),
            }
            outcomes.push(ChannelOutcome {
                channel: channel.channel(),
                result,
            });
        }
        outcomes
    }

    /// Broadcast the run summary to the channels that take one.
    pub async fn broadcast_summary(&self, summary: &RunSummary) -> Vec<ChannelOutcome> {
        let mut outcomes = Vec::new();
        for channel in self.channels.iter().filter(|c| c.handles_summary()) {
            let result = channel.send_summary(summary).await;
            match &result {
                Ok(()) => debug!(channel = channel.channel(), "Summary sent"),
                Err(e) => error!(
                    channel = channel.channel(),
                    error = %e,
                    "Failed to send run summary"
                ),
            }
            outcomes.push(ChannelOutcome {
                channel: channel.channel(),
                result,
            });
        }
        outcomes
    }
}
