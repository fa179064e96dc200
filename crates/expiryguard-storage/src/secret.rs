//! Secret storage - expiring credential records and their notification state.

use anyhow::Result;
use chrono::NaiveDate;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SECRETS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("secrets");

/// Notification threshold ladder.
///
/// A secret crosses thresholds as its expiry date approaches; a smaller
/// day count is more urgent. Escalation only ever moves toward `Urgent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    /// 30 days remaining
    Notice,
    /// 7 days remaining
    Warning,
    /// 3 days remaining (includes already-expired secrets)
    Urgent,
}

impl Threshold {
    /// The days-remaining boundary this threshold represents.
    pub fn days(self) -> i64 {
        match self {
            Threshold::Urgent => 3,
            Threshold::Warning => 7,
            Threshold::Notice => 30,
        }
    }

    /// Urgency label used across all notification channels.
    pub fn label(self) -> &'static str {
        match self {
            Threshold::Urgent => "URGENT",
            Threshold::Warning => "WARNING",
            Threshold::Notice => "NOTICE",
        }
    }

    /// Urgency marker for chat messages.
    pub fn emoji(self) -> &'static str {
        match self {
            Threshold::Urgent => "🚨",
            Threshold::Warning => "⚠️",
            Threshold::Notice => "📅",
        }
    }

    /// Map days remaining to a ladder position, most urgent first.
    ///
    /// Negative values (already expired) fall into the urgent band.
    /// Returns `None` for anything beyond the 30-day window.
    pub fn from_days_remaining(days: i64) -> Option<Threshold> {
        if days <= 3 {
            Some(Threshold::Urgent)
        } else if days <= 7 {
            Some(Threshold::Warning)
        } else if days <= 30 {
            Some(Threshold::Notice)
        } else {
            None
        }
    }

    /// Whether notifying at `self` escalates past a previous notification
    /// at `other` (strictly smaller day count).
    pub fn is_more_urgent_than(self, other: Threshold) -> bool {
        self.days() < other.days()
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A monitored secret with its notification state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub id: String,
    pub name: String,
    /// Owner's email address. The user record itself lives outside this
    /// system; the address is denormalized here for notification delivery.
    pub owner_email: String,
    pub expiry_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    /// Soft-delete flag. Inactive secrets are excluded from every query.
    pub active: bool,
    /// Audit field: when the last notification was sent. Never read by
    /// decision logic.
    #[serde(default)]
    pub last_notified_on: Option<NaiveDate>,
    /// State field: which threshold was last notified. Drives escalation -
    /// a new notification fires only when the current threshold is strictly
    /// more urgent than this one.
    #[serde(default)]
    pub last_notified_threshold: Option<Threshold>,
    pub created_at: i64,
}

impl Secret {
    /// Create a new secret that has never been notified.
    pub fn new(
        name: String,
        owner_email: String,
        expiry_date: NaiveDate,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            owner_email,
            expiry_date,
            notes,
            active: true,
            last_notified_on: None,
            last_notified_threshold: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Secret storage backed by the `secrets` table
#[derive(Debug, Clone)]
pub struct SecretStore {
    db: Arc<Database>,
}

impl SecretStore {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(SECRETS_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Create a new secret (fails if the id already exists)
    pub fn insert(&self, secret: &Secret) -> Result<()> {
        if self.get(&secret.id)?.is_some() {
            return Err(anyhow::anyhow!("Secret {} already exists", secret.id));
        }
        self.save(secret)
    }

    /// Upsert a secret by id.
    ///
    /// The whole record is written in one transaction, so the notification
    /// state fields always persist together.
    pub fn save(&self, secret: &Secret) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SECRETS_TABLE)?;
            let json = serde_json::to_vec(secret)?;
            table.insert(secret.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a secret by id
    pub fn get(&self, id: &str) -> Result<Option<Secret>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SECRETS_TABLE)?;

        if let Some(data) = table.get(id)? {
            Ok(Some(serde_json::from_slice(data.value())?))
        } else {
            Ok(None)
        }
    }

    /// List every record, active or not
    pub fn list_all(&self) -> Result<Vec<Secret>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SECRETS_TABLE)?;

        let mut secrets = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            secrets.push(serde_json::from_slice(value.value())?);
        }
        sort_by_expiry(&mut secrets);

        Ok(secrets)
    }

    /// List active secrets, ascending expiry date
    pub fn list_active(&self) -> Result<Vec<Secret>> {
        Ok(self.list_all()?.into_iter().filter(|s| s.active).collect())
    }

    /// List active secrets with `min <= expiry_date <= max`, both bounds
    /// inclusive, ascending expiry date.
    ///
    /// This is the candidate query for a reconciliation run.
    pub fn list_active_expiring_between(
        &self,
        min: NaiveDate,
        max: NaiveDate,
    ) -> Result<Vec<Secret>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|s| s.active && s.expiry_date >= min && s.expiry_date <= max)
            .collect())
    }

    /// Record that a notification was sent for this secret.
    ///
    /// Sets both notification state fields and persists them in a single
    /// transaction. Returns the updated record.
    pub fn mark_notified(&self, id: &str, threshold: Threshold, on: NaiveDate) -> Result<Secret> {
        let mut secret = self
            .get(id)?
            .ok_or_else(|| anyhow::anyhow!("Secret {} not found", id))?;

        secret.last_notified_on = Some(on);
        secret.last_notified_threshold = Some(threshold);
        self.save(&secret)?;

        tracing::info!(
            secret = %secret.name,
            threshold = threshold.days(),
            "Marked secret as notified"
        );
        Ok(secret)
    }

    /// Soft-delete a secret. Returns false if it did not exist.
    ///
    /// There is no un-delete path; a deactivated secret is permanently
    /// excluded from evaluation.
    pub fn deactivate(&self, id: &str) -> Result<bool> {
        let Some(mut secret) = self.get(id)? else {
            return Ok(false);
        };
        secret.active = false;
        self.save(&secret)?;
        Ok(true)
    }

    /// Count all records
    pub fn count(&self) -> Result<usize> {
        Ok(self.list_all()?.len())
    }
}

fn sort_by_expiry(secrets: &mut [Secret]) {
    secrets.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then_with(|| a.name.cmp(&b.name))
    });
}
