//! ExpiryGuard Storage - persistence layer for monitored secrets
//!
//! This crate provides the persistence layer for ExpiryGuard, using redb as
//! the embedded database. Records are stored as serde_json bytes under a
//! string key, one table per entity type.
//!
//! # Tables
//!
//! - `secrets` - Monitored secret records and their notification state

pub mod secret;

pub use secret::{Secret, SecretStore, Threshold};

use anyhow::Result;
use redb::Database;
use std::sync::Arc;

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    db: Arc<Database>,
    pub secrets: SecretStore,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);

        let secrets = SecretStore::new(db.clone())?;

        Ok(Self { db, secrets })
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
