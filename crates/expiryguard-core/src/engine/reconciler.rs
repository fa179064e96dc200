//! One reconciliation run: fetch candidates, evaluate each, dispatch what is
//! due, commit notification state, broadcast a summary.
//!
//! Runs never overlap: a run that fires while another is in progress logs a
//! warning and returns immediately. Within a run the only fatal error is a
//! failed candidate fetch; everything after that point is logged and skipped
//! per secret or per channel.

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use expiryguard_storage::{Storage, Threshold};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::SchedulerConfig;
use crate::evaluate::evaluate;
use crate::notify::{Dispatcher, ExpiryEvent, RunSummary};

/// Totals from one reconciliation run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Secrets fetched inside the lookahead window
    pub candidates: usize,
    /// Notifications dispatched this run
    pub notified: usize,
    /// Names notified at the 3-day threshold this run
    pub urgent_names: Vec<String>,
    /// True when the run did not execute (disabled, or already in progress)
    pub skipped: bool,
}

impl RunReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// The reconciliation job.
///
/// Holds the storage and dispatcher handles plus a run guard that keeps
/// concurrent triggers from racing each other over the same secrets.
pub struct Reconciler {
    storage: Arc<Storage>,
    dispatcher: Arc<Dispatcher>,
    config: SchedulerConfig,
    run_guard: Mutex<()>,
}

impl Reconciler {
    pub fn new(storage: Arc<Storage>, dispatcher: Arc<Dispatcher>, config: SchedulerConfig) -> Self {
        Self {
            storage,
            dispatcher,
            config,
            run_guard: Mutex::new(()),
        }
    }

    /// Execute one reconciliation pass against today's UTC date.
    pub async fn run_once(&self) -> Result<RunReport> {
        self.run_for_date(Utc::now().date_naive()).await
    }

    /// Date-parameterized run, so the cycle is testable without a clock.
    pub async fn run_for_date(&self, today: NaiveDate) -> Result<RunReport> {
        if !self.config.enabled {
            info!("Expiry notifications are disabled; skipping run");
            return Ok(RunReport::skipped());
        }

        // Non-overlap invariant: the trigger that loses this race skips.
        let Ok(_guard) = self.run_guard.try_lock() else {
            warn!("Reconciliation run already in progress; skipping this trigger");
            return Ok(RunReport::skipped());
        };

        let max = today + Duration::days(i64::from(self.config.lookahead_days));
        let candidates = self
            .storage
            .secrets
            .list_active_expiring_between(today, max)?;

        info!(
            candidates = candidates.len(),
            lookahead_days = self.config.lookahead_days,
            "Checking secrets for expiry notifications"
        );

        let mut report = RunReport {
            candidates: candidates.len(),
            ..Default::default()
        };

        for secret in &candidates {
            let decision = evaluate(today, secret);
            let Some(threshold) = decision.due else {
                continue;
            };

            let event = ExpiryEvent::new(secret, threshold, decision.days_remaining);
            self.dispatcher.dispatch(&event).await;

            report.notified += 1;
            if threshold == Threshold::Urgent {
                report.urgent_names.push(secret.name.clone());
            }

            // Best-effort commit: on failure the secret stays eligible and
            // will be re-notified on the next run.
            if let Err(e) = self
                .storage
                .secrets
                .mark_notified(&secret.id, threshold, today)
            {
                error!(
                    secret = %secret.name,
                    error = %e,
                    "Failed to record notification state; secret will be re-notified next run"
                );
            }
        }

        if self.dispatcher.is_summary_configured() {
            let summary = RunSummary {
                total_candidates: report.candidates,
                notifications_sent: report.notified,
                urgent_names: report.urgent_names.clone(),
            };
            self.dispatcher.broadcast_summary(&summary).await;
        }

        info!(
            candidates = report.candidates,
            notified = report.notified,
            "Reconciliation run complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notifier, NotifyError};
    use async_trait::async_trait;
    use expiryguard_storage::Secret;
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;
    use tokio::sync::Notify;

    struct RecordingNotifier {
        fail: bool,
        summaries: bool,
        events: StdMutex<Vec<ExpiryEvent>>,
        summaries_received: StdMutex<Vec<RunSummary>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                fail: false,
                summaries: false,
                events: StdMutex::new(Vec::new()),
                summaries_received: StdMutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn with_summaries() -> Self {
            Self {
                summaries: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn channel(&self) -> &'static str {
            "recording"
        }

        async fn send_expiry(&self, event: &ExpiryEvent) -> Result<(), NotifyError> {
            self.events.lock().unwrap().push(event.clone());
            if self.fail {
                Err(NotifyError::Status {
                    channel: "recording",
                    status: 500,
                })
            } else {
                Ok(())
            }
        }

        fn handles_summary(&self) -> bool {
            self.summaries
        }

        async fn send_summary(&self, summary: &RunSummary) -> Result<(), NotifyError> {
            self.summaries_received.lock().unwrap().push(summary.clone());
            Ok(())
        }
    }

    /// Adapter so a test can keep a handle to a notifier the dispatcher owns.
    struct ArcNotifier(Arc<RecordingNotifier>);

    #[async_trait]
    impl Notifier for ArcNotifier {
        fn channel(&self) -> &'static str {
            self.0.channel()
        }

        async fn send_expiry(&self, event: &ExpiryEvent) -> Result<(), NotifyError> {
            self.0.send_expiry(event).await
        }

        fn handles_summary(&self) -> bool {
            self.0.handles_summary()
        }

        async fn send_summary(&self, summary: &RunSummary) -> Result<(), NotifyError> {
            self.0.send_summary(summary).await
        }
    }

    /// Blocks inside send_expiry until released, to hold a run open.
    struct BlockingNotifier {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Notifier for BlockingNotifier {
        fn channel(&self) -> &'static str {
            "blocking"
        }

        async fn send_expiry(&self, _event: &ExpiryEvent) -> Result<(), NotifyError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(())
        }
    }

    const TODAY: fn() -> NaiveDate = || NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();

    fn setup_storage() -> (Arc<Storage>, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = Arc::new(Storage::new(db_path.to_str().unwrap()).unwrap());
        (storage, temp_dir)
    }

    fn reconciler_with(
        storage: Arc<Storage>,
        channels: Vec<Box<dyn Notifier>>,
        enabled: bool,
    ) -> Reconciler {
        let config = SchedulerConfig {
            enabled,
            ..SchedulerConfig::default()
        };
        Reconciler::new(
            storage,
            Arc::new(Dispatcher::with_channels(channels)),
            config,
        )
    }

    fn expiring_in(today: NaiveDate, days: i64, name: &str) -> Secret {
        Secret::new(
            name.to_string(),
            "owner@example.com".to_string(),
            today + Duration::days(days),
            None,
        )
    }

    #[tokio::test]
    async fn test_disabled_run_does_nothing() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        let due = expiring_in(today, 2, "due-soon");
        storage.secrets.insert(&due).unwrap();

        let notifier = Arc::new(RecordingNotifier::new());
        let reconciler = reconciler_with(
            storage.clone(),
            vec![Box::new(ArcNotifier(notifier.clone()))],
            false,
        );

        let report = reconciler.run_for_date(today).await.unwrap();
        assert!(report.skipped);
        assert_eq!(report.candidates, 0);
        assert!(notifier.events.lock().unwrap().is_empty());

        // No commit happened either
        let reloaded = storage.secrets.get(&due.id).unwrap().unwrap();
        assert!(reloaded.last_notified_threshold.is_none());
    }

    #[tokio::test]
    async fn test_run_notifies_and_commits() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        let urgent = expiring_in(today, 2, "prod-db-cert");
        let warning = expiring_in(today, 6, "api-key");
        let outside = expiring_in(today, 40, "far-away");
        storage.secrets.insert(&urgent).unwrap();
        storage.secrets.insert(&warning).unwrap();
        storage.secrets.insert(&outside).unwrap();

        let notifier = Arc::new(RecordingNotifier::new());
        let reconciler = reconciler_with(
            storage.clone(),
            vec![Box::new(ArcNotifier(notifier.clone()))],
            true,
        );

        let report = reconciler.run_for_date(today).await.unwrap();
        assert!(!report.skipped);
        assert_eq!(report.candidates, 2);
        assert_eq!(report.notified, 2);
        assert_eq!(report.urgent_names, vec!["prod-db-cert".to_string()]);

        let events = notifier.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        // Candidates arrive in ascending expiry order
        assert_eq!(events[0].secret_name, "prod-db-cert");
        assert_eq!(events[0].threshold, Threshold::Urgent);
        assert_eq!(events[1].secret_name, "api-key");
        assert_eq!(events[1].threshold, Threshold::Warning);

        let committed = storage.secrets.get(&urgent.id).unwrap().unwrap();
        assert_eq!(committed.last_notified_threshold, Some(Threshold::Urgent));
        assert_eq!(committed.last_notified_on, Some(today));

        let untouched = storage.secrets.get(&outside.id).unwrap().unwrap();
        assert!(untouched.last_notified_threshold.is_none());
    }

    #[tokio::test]
    async fn test_second_run_same_day_is_idempotent() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        storage
            .secrets
            .insert(&expiring_in(today, 5, "tls-cert"))
            .unwrap();

        let notifier = Arc::new(RecordingNotifier::new());
        let reconciler = reconciler_with(
            storage.clone(),
            vec![Box::new(ArcNotifier(notifier.clone()))],
            true,
        );

        let first = reconciler.run_for_date(today).await.unwrap();
        assert_eq!(first.notified, 1);

        let second = reconciler.run_for_date(today).await.unwrap();
        assert_eq!(second.candidates, 1);
        assert_eq!(second.notified, 0);
        assert_eq!(notifier.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_channel_failure_still_commits() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        let secret = expiring_in(today, 2, "flaky-target");
        storage.secrets.insert(&secret).unwrap();

        let notifier = Arc::new(RecordingNotifier::failing());
        let reconciler = reconciler_with(
            storage.clone(),
            vec![Box::new(ArcNotifier(notifier.clone()))],
            true,
        );

        let report = reconciler.run_for_date(today).await.unwrap();
        assert_eq!(report.notified, 1);

        // The send was attempted and state committed despite the failure
        assert_eq!(notifier.events.lock().unwrap().len(), 1);
        let committed = storage.secrets.get(&secret.id).unwrap().unwrap();
        assert_eq!(committed.last_notified_threshold, Some(Threshold::Urgent));
    }

    #[tokio::test]
    async fn test_no_channels_still_commits() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        let secret = expiring_in(today, 10, "unwatched");
        storage.secrets.insert(&secret).unwrap();

        let reconciler = reconciler_with(storage.clone(), vec![], true);
        let report = reconciler.run_for_date(today).await.unwrap();
        assert_eq!(report.notified, 1);

        let committed = storage.secrets.get(&secret.id).unwrap().unwrap();
        assert_eq!(committed.last_notified_threshold, Some(Threshold::Notice));
    }

    #[tokio::test]
    async fn test_summary_totals() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        // Ten candidates in the window; eight already notified in-band, two due
        storage
            .secrets
            .insert(&expiring_in(today, 1, "prod-db-cert"))
            .unwrap();
        storage
            .secrets
            .insert(&expiring_in(today, 6, "staging-token"))
            .unwrap();
        for i in 0..8 {
            let mut quiet = expiring_in(today, 20 + i, &format!("quiet-{i}"));
            quiet.last_notified_threshold = Some(Threshold::Notice);
            storage.secrets.insert(&quiet).unwrap();
        }

        let chat = Arc::new(RecordingNotifier::with_summaries());
        let reconciler = reconciler_with(
            storage.clone(),
            vec![Box::new(ArcNotifier(chat.clone()))],
            true,
        );

        let report = reconciler.run_for_date(today).await.unwrap();
        assert_eq!(report.candidates, 10);
        assert_eq!(report.notified, 2);

        let summaries = chat.summaries_received.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_candidates, 10);
        assert_eq!(summaries[0].notifications_sent, 2);
        assert_eq!(summaries[0].urgent_names, vec!["prod-db-cert".to_string()]);
    }

    #[tokio::test]
    async fn test_no_summary_without_summary_channel() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        storage
            .secrets
            .insert(&expiring_in(today, 2, "cert"))
            .unwrap();

        // The recording channel does not take summaries
        let notifier = Arc::new(RecordingNotifier::new());
        let reconciler = reconciler_with(
            storage.clone(),
            vec![Box::new(ArcNotifier(notifier.clone()))],
            true,
        );

        reconciler.run_for_date(today).await.unwrap();
        assert!(notifier.summaries_received.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_runs_skip() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        storage
            .secrets
            .insert(&expiring_in(today, 2, "contended"))
            .unwrap();

        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let reconciler = Arc::new(reconciler_with(
            storage.clone(),
            vec![Box::new(BlockingNotifier {
                entered: entered.clone(),
                release: release.clone(),
            })],
            true,
        ));

        let first = {
            let reconciler = reconciler.clone();
            tokio::spawn(async move { reconciler.run_for_date(today).await })
        };

        // Wait until the first run is inside dispatch and holding the guard
        entered.notified().await;

        let second = reconciler.run_for_date(today).await.unwrap();
        assert!(second.skipped);

        release.notify_one();
        let first = first.await.unwrap().unwrap();
        assert!(!first.skipped);
        assert_eq!(first.notified, 1);
    }

    #[tokio::test]
    async fn test_expired_secret_notified_as_urgent() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        // Candidate fetch starts at today, so an expired secret only shows
        // up when its expiry date is still inside the window; at exactly
        // today it is fetched and treated as urgent.
        let secret = expiring_in(today, 0, "expires-today");
        storage.secrets.insert(&secret).unwrap();

        let notifier = Arc::new(RecordingNotifier::new());
        let reconciler = reconciler_with(
            storage.clone(),
            vec![Box::new(ArcNotifier(notifier.clone()))],
            true,
        );

        let report = reconciler.run_for_date(today).await.unwrap();
        assert_eq!(report.urgent_names, vec!["expires-today".to_string()]);
        let events = notifier.events.lock().unwrap();
        assert_eq!(events[0].days_remaining, 0);
        assert_eq!(events[0].threshold, Threshold::Urgent);
    }

    #[tokio::test]
    async fn test_window_bounds_match_lookahead() {
        let (storage, _temp_dir) = setup_storage();
        let today = TODAY();

        storage
            .secrets
            .insert(&expiring_in(today, 30, "at-edge"))
            .unwrap();
        storage
            .secrets
            .insert(&expiring_in(today, 31, "past-edge"))
            .unwrap();
        storage
            .secrets
            .insert(&expiring_in(today, -1, "already-expired"))
            .unwrap();

        let reconciler = reconciler_with(storage.clone(), vec![], true);
        let report = reconciler.run_for_date(today).await.unwrap();

        // Yesterday's expiry is behind the window start; 31 days is past the
        // end. Only the 30-day secret is a candidate.
        assert_eq!(report.candidates, 1);
        assert_eq!(report.notified, 1);
        assert_eq!(report.urgent_names, Vec::<String>::new());
    }
}
