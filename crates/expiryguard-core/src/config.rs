//! Runtime configuration.
//!
//! Loaded from a TOML file; every section is optional and falls back to
//! defaults, so an empty file is a valid configuration (no channels
//! configured, daily 09:00 UTC schedule).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

// Default configuration constants
const DEFAULT_CRON: &str = "0 0 9 * * *"; // 09:00 every day (sec min hour day month weekday)
const DEFAULT_LOOKAHEAD_DAYS: u32 = 30;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SEND_TIMEOUT_SECONDS: u64 = 10;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub email: EmailConfig,
    pub webhook: WebhookConfig,
    pub storage: StorageConfig,
}

/// Reconciliation schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// 6-field cron expression (sec min hour day month weekday)
    pub cron: String,
    /// IANA timezone name; None means UTC
    pub timezone: Option<String>,
    /// How far ahead of today the candidate query reaches, in days
    pub lookahead_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: DEFAULT_CRON.to_string(),
            timezone: None,
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }
}

/// SMTP email channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Sender address; defaults to the SMTP username
    pub from: Option<String>,
    pub use_tls: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smtp_server: None,
            smtp_port: DEFAULT_SMTP_PORT,
            smtp_username: None,
            smtp_password: None,
            from: None,
            use_tls: true,
        }
    }
}

impl EmailConfig {
    /// Whether the channel is active. A missing server or username means
    /// the channel was never set up, which is not an error.
    pub fn is_configured(&self) -> bool {
        self.enabled && self.smtp_server.is_some() && self.smtp_username.is_some()
    }

    /// The address notifications are sent from.
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.smtp_username.as_deref())
    }
}

/// Outbound webhook channels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub slack_url: Option<String>,
    pub discord_url: Option<String>,
    pub generic_url: Option<String>,
    /// Bound on each outbound HTTP send
    pub timeout_seconds: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slack_url: None,
            discord_url: None,
            generic_url: None,
            timeout_seconds: DEFAULT_SEND_TIMEOUT_SECONDS,
        }
    }
}

impl WebhookConfig {
    /// Check if any webhook is configured.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && (self.slack_url.is_some()
                || self.discord_url.is_some()
                || self.generic_url.is_some())
    }
}

/// Database location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the redb database file; None falls back to the data dir
    pub path: Option<String>,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        cron::Schedule::from_str(&self.scheduler.cron).map_err(|e| {
            anyhow::anyhow!("Invalid cron expression '{}': {}", self.scheduler.cron, e)
        })?;

        if let Some(tz) = &self.scheduler.timezone {
            chrono_tz::Tz::from_str(tz)
                .map_err(|e| anyhow::anyhow!("Invalid timezone {}: {}", tz, e))?;
        }

        if self.scheduler.lookahead_days == 0 {
            return Err(anyhow::anyhow!("Lookahead window must be at least 1 day"));
        }

        if self.webhook.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Webhook timeout must be at least 1 second"));
        }

        Ok(())
    }
}
