pub mod config;
pub mod engine;
pub mod evaluate;
pub mod notify;
pub mod paths;

pub use expiryguard_storage::{Secret, SecretStore, Storage, Threshold};

use crate::config::Config;
use crate::engine::Reconciler;
use crate::notify::Dispatcher;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Core application state shared between the daemon and one-shot modes
///
/// Wires the storage layer, the notification dispatcher, and the
/// reconciliation job together from one loaded configuration.
pub struct AppCore {
    pub config: Config,
    pub storage: Arc<Storage>,
    pub dispatcher: Arc<Dispatcher>,
    pub reconciler: Arc<Reconciler>,
}

impl AppCore {
    pub fn new(config: Config, db_path: &str) -> Result<Self> {
        let storage = Arc::new(Storage::new(db_path)?);
        let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
        let reconciler = Arc::new(Reconciler::new(
            storage.clone(),
            dispatcher.clone(),
            config.scheduler.clone(),
        ));

        info!(
            channels = dispatcher.channel_count(),
            db = %db_path,
            "Initializing ExpiryGuard"
        );

        Ok(Self {
            config,
            storage,
            dispatcher,
            reconciler,
        })
    }
}
