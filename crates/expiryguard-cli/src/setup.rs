//! CLI setup module
//!
//! Handles configuration loading and core initialization for CLI usage.

use anyhow::Result;
use expiryguard_core::config::Config;
use expiryguard_core::{AppCore, paths};
use std::path::Path;
use std::sync::Arc;

use crate::cli::Cli;

/// Load configuration from an explicit path or the default location.
///
/// A missing default config file is not an error; it means an all-defaults
/// configuration (no channels set up, daily 09:00 UTC schedule).
pub fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::load(Path::new(path)),
        None => {
            let default = paths::config_path()?;
            if default.exists() {
                Config::load(&default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Build the embedded ExpiryGuard core.
///
/// Database path priority: CLI flag > config file > ~/.expiryguard default.
pub fn prepare_core(cli: &Cli) -> Result<Arc<AppCore>> {
    let config = load_config(cli.config.as_deref())?;
    let db_path = match cli.db_path.clone().or_else(|| config.storage.path.clone()) {
        Some(path) => path,
        None => paths::ensure_database_path_string()?,
    };
    Ok(Arc::new(AppCore::new(config, &db_path)?))
}
