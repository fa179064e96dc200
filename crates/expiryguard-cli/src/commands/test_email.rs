use anyhow::{Result, bail};
use std::sync::Arc;

use expiryguard_core::AppCore;
use expiryguard_core::notify::EmailNotifier;

/// Send a test message through the configured SMTP channel.
pub async fn run(core: Arc<AppCore>, to: &str) -> Result<()> {
    let Some(email) = EmailNotifier::from_config(&core.config.email)? else {
        bail!("Email channel is not configured; set smtp_server and smtp_username in [email]");
    };

    email.send_test(to).await?;
    println!("Test email sent to {to}");
    Ok(())
}
