use anyhow::Result;
use std::sync::Arc;

use expiryguard_core::AppCore;

/// Run a single reconciliation pass and print the report.
pub async fn run(core: Arc<AppCore>) -> Result<()> {
    let report = core.reconciler.run_once().await?;

    if report.skipped {
        println!("Run skipped (notifications are disabled)");
        return Ok(());
    }

    println!("Candidates in window: {}", report.candidates);
    println!("Notifications sent:   {}", report.notified);
    if !report.urgent_names.is_empty() {
        println!("Urgent (3-day):       {}", report.urgent_names.join(", "));
    }
    Ok(())
}
