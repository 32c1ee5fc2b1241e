//! Common filesystem paths used by ripcomp.

use std::path::PathBuf;

/// Base directory for ripcomp state (config).
///
/// Defaults to `~/.config/ripcomp`, but can be overridden via `RIPCOMP_DIR`
/// for testing or multi-instance setups.
pub fn ripcomp_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RIPCOMP_DIR") {
        return PathBuf::from(dir);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".config").join("ripcomp")
}

/// Path to the ripcomp configuration file.
pub fn config_path() -> PathBuf {
    ripcomp_dir().join("config.toml")
}

#[doc(hidden)]
pub fn test_env_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
