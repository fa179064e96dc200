//! SMTP email channel.
//!
//! Email is the one channel addressed to the secret's owner rather than a
//! fixed operations endpoint, and it is attempted independently of the
//! webhook set.

use async_trait::async_trait;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::info;

use super::{ExpiryEvent, Notifier, NotifyError};
use crate::config::EmailConfig;

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailNotifier {
    /// Build the channel from configuration.
    ///
    /// Returns `Ok(None)` when the channel is disabled or was never set up
    /// (missing server or username) - absence is not an error.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, NotifyError> {
        if !config.is_configured() {
            return Ok(None);
        }
        let (Some(server), Some(username)) = (&config.smtp_server, &config.smtp_username) else {
            return Ok(None);
        };

        let from: Mailbox = config
            .sender()
            .ok_or_else(|| NotifyError::Config("No sender address configured".to_string()))?
            .parse()?;

        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(server)
        };
        builder = builder.port(config.smtp_port);
        if let Some(password) = &config.smtp_password {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Some(Self {
            mailer: builder.build(),
            from,
        }))
    }

    /// Send a test message to verify the SMTP configuration end to end.
    pub async fn send_test(&self, to: &str) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse::<Mailbox>()?)
            .subject("ExpiryGuard: Test Email Notification")
            .body(format!(
                "This is a test email from ExpiryGuard.\n\n\
                 If you received this email, your email configuration is working correctly!\n\n\
                 Test sent at: {}",
                chrono::Utc::now().to_rfc3339()
            ))?;

        self.mailer.send(message).await?;
        info!(to = %to, "Test email sent");
        Ok(())
    }
}

fn expiry_subject(event: &ExpiryEvent) -> String {
    format!(
        "ExpiryGuard reminder: {} expires in {} days",
        event.secret_name, event.days_remaining
    )
}

fn expiry_body(event: &ExpiryEvent) -> String {
    format!(
        "Your secret '{}' will expire on {} ({} days remaining).\n\n\
         Please take necessary action to renew or update it.",
        event.secret_name, event.expiry_date, event.days_remaining
    )
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn send_expiry(&self, event: &ExpiryEvent) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(event.owner_email.parse::<Mailbox>()?)
            .subject(expiry_subject(event))
            .body(expiry_body(event))?;

        self.mailer.send(message).await?;
        info!(
            to = %event.owner_email,
            secret = %event.secret_name,
            "Expiry email sent"
        );
        Ok(())
    }
}
