//! The reconciliation engine: the periodic job that walks expiring secrets
//! and the cron scheduler that triggers it.

pub mod reconciler;
pub mod scheduler;

pub use reconciler::{Reconciler, RunReport};
pub use scheduler::NotificationScheduler;
