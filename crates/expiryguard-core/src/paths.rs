use anyhow::Result;
use std::path::PathBuf;

const EXPIRYGUARD_DIR: &str = ".expiryguard";
const DB_FILE: &str = "expiryguard.db";
const CONFIG_FILE: &str = "config.toml";

/// Environment variable to override the ExpiryGuard directory.
const EXPIRYGUARD_DIR_ENV: &str = "EXPIRYGUARD_DIR";

/// Resolve the ExpiryGuard data directory.
/// Priority: EXPIRYGUARD_DIR env var > ~/.expiryguard/
pub fn resolve_expiryguard_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(EXPIRYGUARD_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(EXPIRYGUARD_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the ExpiryGuard directory exists and return its path.
pub fn ensure_expiryguard_dir() -> Result<PathBuf> {
    let dir = resolve_expiryguard_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Get the database path: ~/.expiryguard/expiryguard.db
pub fn database_path() -> Result<PathBuf> {
    Ok(resolve_expiryguard_dir()?.join(DB_FILE))
}

/// Ensure the database directory exists and return the database path.
pub fn ensure_database_path() -> Result<PathBuf> {
    Ok(ensure_expiryguard_dir()?.join(DB_FILE))
}

/// Convenience helper returning the database path as a UTF-8 string.
pub fn ensure_database_path_string() -> Result<String> {
    Ok(ensure_database_path()?.to_string_lossy().into_owned())
}

/// Get the config file path: ~/.expiryguard/config.toml
pub fn config_path() -> Result<PathBuf> {
    Ok(resolve_expiryguard_dir()?.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    #[test]
    fn test_default_expiryguard_dir() {
        let _lock = env_lock();
        unsafe { std::env::remove_var(EXPIRYGUARD_DIR_ENV) };
        let dir = resolve_expiryguard_dir().unwrap();
        assert!(dir.ends_with(EXPIRYGUARD_DIR));
    }

    #[test]
    fn test_env_override() {
        let _lock = env_lock();
        unsafe { std::env::set_var(EXPIRYGUARD_DIR_ENV, "/tmp/test-expiryguard") };
        let dir = resolve_expiryguard_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/test-expiryguard"));
        unsafe { std::env::remove_var(EXPIRYGUARD_DIR_ENV) };
    }

    #[test]
    fn test_database_path() {
        let _lock = env_lock();
        unsafe { std::env::remove_var(EXPIRYGUARD_DIR_ENV) };
        let path = database_path().unwrap();
        assert!(path.ends_with(DB_FILE));
        assert!(path.parent().unwrap().ends_with(EXPIRYGUARD_DIR));
    }

    #[test]
    fn test_config_path() {
        let _lock = env_lock();
        unsafe { std::env::remove_var(EXPIRYGUARD_DIR_ENV) };
        let path = config_path().unwrap();
        assert!(path.ends_with(CONFIG_FILE));
    }
}
