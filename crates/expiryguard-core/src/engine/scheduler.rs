//! Cron-driven invocation of the reconciliation job.
//!
//! Wraps `tokio-cron-scheduler` around a single recurring job that calls
//! [`Reconciler::run_once`]. Overlap protection lives in the reconciler's
//! run guard, not here; the scheduler only fires the trigger.

use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use std::str::FromStr;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::engine::Reconciler;

/// Schedules the periodic reconciliation run.
///
/// Supports 6-field cron expressions (sec min hour day month weekday) and an
/// optional IANA timezone; without one the expression is evaluated in UTC.
pub struct NotificationScheduler {
    scheduler: JobScheduler,
    reconciler: Arc<Reconciler>,
    config: SchedulerConfig,
    job_id: Option<Uuid>,
}

impl NotificationScheduler {
    pub async fn new(reconciler: Arc<Reconciler>, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            scheduler,
            reconciler,
            config,
            job_id: None,
        })
    }

    /// Register the reconciliation job and start the scheduler.
    ///
    /// When the schedule is disabled nothing is registered; the process stays
    /// up but no run ever fires.
    pub async fn start(&mut self) -> Result<()> {
        if !self.config.enabled {
            info!("Expiry notification schedule is disabled; no job registered");
            return Ok(());
        }

        let job = self.build_job()?;
        let job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add job to scheduler: {}", e))?;
        self.job_id = Some(job_id);

        self.scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start scheduler: {}", e))?;

        info!(
            cron = %self.config.cron,
            timezone = self.config.timezone.as_deref().unwrap_or("UTC"),
            job_id = %job_id,
            "Notification scheduler started"
        );
        Ok(())
    }

    fn build_job(&self) -> Result<Job> {
        let reconciler = self.reconciler.clone();
        let cron_expr = self.config.cron.as_str();

        let run = move |_uuid: Uuid, _l: JobScheduler| {
            let reconciler = reconciler.clone();
            Box::pin(async move {
                info!("Scheduled reconciliation triggered");
                if let Err(e) = reconciler.run_once().await {
                    error!(error = %e, "Reconciliation run failed");
                }
            }) as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        };

        let job = if let Some(tz) = &self.config.timezone {
            let timezone: Tz =
                Tz::from_str(tz).map_err(|e| anyhow!("Invalid timezone {}: {}", tz, e))?;
            Job::new_async_tz(cron_expr, timezone, run)
                .map_err(|e| anyhow!("Failed to create cron job with timezone: {}", e))?
        } else {
            Job::new_async(cron_expr, run)
                .map_err(|e| anyhow!("Failed to create cron job: {}", e))?
        };

        Ok(job)
    }

    /// Whether a job is currently registered.
    pub fn is_scheduled(&self) -> bool {
        self.job_id.is_some()
    }

    /// Shut down the scheduler.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to shutdown scheduler: {}", e))?;

        info!("Notification scheduler shut down");
        Ok(())
    }
}
