use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default reconciliation cadence.
pub const DEFAULT_RECONCILE_INTERVAL_MS: u64 = 1000;

/// Reconciliation never runs more often than this.
pub const MIN_RECONCILE_INTERVAL_MS: u64 = 100;

/// Default capacity of the detector command queue.
pub const DEFAULT_COMMAND_QUEUE: usize = 1024;

/// Application configuration loaded from ~/.config/leakwatch/config.toml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Milliseconds between reconciliation ticks.
    pub reconcile_interval_ms: u64,

    /// Pending detector commands before interception handlers wait.
    pub command_queue: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_ms: DEFAULT_RECONCILE_INTERVAL_MS,
            command_queue: DEFAULT_COMMAND_QUEUE,
        }
    }
}

impl AppConfig {
    /// Reconciliation interval, clamped to [`MIN_RECONCILE_INTERVAL_MS`].
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_millis(self.reconcile_interval_ms.max(MIN_RECONCILE_INTERVAL_MS))
    }

    /// Queue capacity, at least 1.
    pub fn command_queue(&self) -> usize {
        self.command_queue.max(1)
    }
}

/// Get the config file path.
pub fn config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home)
            .join(".config")
            .join("leakwatch")
            .join("config.toml")
    } else if let Ok(appdata) = std::env::var("APPDATA") {
        PathBuf::from(appdata).join("leakwatch").join("config.toml")
    } else {
        PathBuf::from("config.toml")
    }
}

/// Load the application config from the default path.
pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

/// Load the application config from `path`, falling back to defaults when the
/// file is missing or invalid.
pub fn load_config_from(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config at {}: {e}", path.display());
            AppConfig::default()
        }),
        Err(e) => {
            log::warn!("Failed to read config at {}: {e}", path.display());
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_returns_non_empty_path() {
        let path = config_path();
        assert!(!path.as_os_str().is_empty());
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn app_config_default_works() {
        let config = AppConfig::default();
        assert_eq!(config.reconcile_interval(), Duration::from_secs(1));
        assert_eq!(config.command_queue(), DEFAULT_COMMAND_QUEUE);
    }

    #[test]
    fn app_config_deserializes_from_toml() {
        let config: AppConfig = toml::from_str("reconcile_interval_ms = 250\n").expect("parse toml");
        assert_eq!(config.reconcile_interval(), Duration::from_millis(250));
        assert_eq!(config.command_queue, DEFAULT_COMMAND_QUEUE);
    }

    #[test]
    fn interval_and_queue_are_clamped() {
        let config = AppConfig {
            reconcile_interval_ms: 5,
            command_queue: 0,
        };
        assert_eq!(
            config.reconcile_interval(),
            Duration::from_millis(MIN_RECONCILE_INTERVAL_MS)
        );
        assert_eq!(config.command_queue(), 1);
    }

    #[test]
    fn load_config_from_missing_file_returns_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config_from(&dir.path().join("absent.toml"));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn load_config_from_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "reconcile_interval_ms = 2000\ncommand_queue = 64\n")
            .expect("write config");

        let config = load_config_from(&path);
        assert_eq!(config.reconcile_interval(), Duration::from_secs(2));
        assert_eq!(config.command_queue(), 64);
    }

    #[test]
    fn load_config_from_invalid_file_returns_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "reconcile_interval_ms = \"soon\"\n").expect("write config");

        assert_eq!(load_config_from(&path), AppConfig::default());
    }
}
