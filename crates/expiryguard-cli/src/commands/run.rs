use anyhow::Result;
use std::sync::Arc;

use expiryguard_core::AppCore;
use expiryguard_core::engine::NotificationScheduler;

/// Start the cron scheduler and block until Ctrl+C.
pub async fn run(core: Arc<AppCore>) -> Result<()> {
    let mut scheduler = NotificationScheduler::new(
        core.reconciler.clone(),
        core.config.scheduler.clone(),
    )
    .await?;
    scheduler.start().await?;

    if scheduler.is_scheduled() {
        println!(
            "ExpiryGuard running (schedule: {}). Press Ctrl+C to stop.",
            core.config.scheduler.cron
        );
    } else {
        println!("ExpiryGuard running with notifications disabled. Press Ctrl+C to stop.");
    }

    tokio::signal::ctrl_c().await?;

    scheduler.shutdown().await?;
    println!("Stopped");
    Ok(())
}
