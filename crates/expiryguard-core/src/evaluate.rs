//! Threshold evaluation - the pure decision half of the reconciliation
//! engine.
//!
//! `evaluate` has no side effects and no clock access; the caller supplies
//! "today". The rules:
//!
//! - more than 30 days out: never due
//! - never notified and inside the 30-day window: due at the current ladder
//!   position
//! - already notified: due again only when the current position is strictly
//!   more urgent than the recorded one (escalation is monotonic, there is no
//!   de-escalation)

use chrono::NaiveDate;
use expiryguard_storage::{Secret, Threshold};

/// Outcome of evaluating one secret against today's date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Days until expiry; negative for already-expired secrets
    pub days_remaining: i64,
    /// The threshold to notify at, or None when nothing is due
    pub due: Option<Threshold>,
}

impl Decision {
    pub fn is_due(&self) -> bool {
        self.due.is_some()
    }
}

/// Decide whether a notification is due for this secret.
pub fn evaluate(today: NaiveDate, secret: &Secret) -> Decision {
    let days_remaining = (secret.expiry_date - today).num_days();

    let Some(current) = Threshold::from_days_remaining(days_remaining) else {
        return Decision {
            days_remaining,
            due: None,
        };
    };

    let due = match secret.last_notified_threshold {
        None => Some(current),
        Some(last) if current.is_more_urgent_than(last) => Some(current),
        Some(_) => None,
    };

    Decision {
        days_remaining,
        due,
    }
}
