//! Configuration management

use crate::error::{PanelError, PanelResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default session inactivity timeout (15 minutes)
pub const DEFAULT_SESSION_TIMEOUT_MS: u64 = 15 * 60 * 1000;
/// Default interval between expired-session sweeps (1 minute)
pub const DEFAULT_SESSION_CLEANUP_INTERVAL_MS: u64 = 60 * 1000;
/// Default lock expiry (30 minutes). Zero or negative disables expiry.
pub const DEFAULT_LOCK_TIMEOUT_MS: i64 = 30 * 60 * 1000;
/// Default interval between expired-lock sweeps (5 minutes)
pub const DEFAULT_LOCK_CLEANUP_INTERVAL_MS: u64 = 5 * 60 * 1000;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub session: SessionSettings,
    pub locks: LockSettings,
    pub users: UserSettings,
    pub server: ServerSettings,
    pub logging: LoggingConfig,
}

/// Session lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Inactivity period after which a session expires
    pub timeout_ms: u64,
    /// Minimum time between two expired-session sweeps
    pub cleanup_interval_ms: u64,
    /// `Max-Age` of the session cookie, in seconds
    pub cookie_max_age_secs: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_SESSION_TIMEOUT_MS,
            cleanup_interval_ms: DEFAULT_SESSION_CLEANUP_INTERVAL_MS,
            cookie_max_age_secs: 900,
        }
    }
}

/// Resource lock settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Location of the persisted lock document
    pub store_path: PathBuf,
    /// Lock expiry; `<= 0` turns expiry off entirely
    pub timeout_ms: i64,
    /// Minimum time between two expired-lock sweeps
    pub cleanup_interval_ms: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/locks/active_locks.json"),
            timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            cleanup_interval_ms: DEFAULT_LOCK_CLEANUP_INTERVAL_MS,
        }
    }
}

impl LockSettings {
    /// Whether locks expire at all
    pub fn expiry_enabled(&self) -> bool {
        self.timeout_ms > 0
    }
}

/// User account storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Directory holding one JSON document per user
    pub user_dir: PathBuf,
    /// Create the default owner account when no users exist
    pub create_default_owner: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            user_dir: PathBuf::from("data/users"),
            create_default_owner: true,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Deployment is served over HTTPS only; adds `Secure` to cookies
    pub https_only: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            https_only: false,
        }
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl PanelConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PanelResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PanelError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: PanelConfig = toml::from_str(&content).map_err(|e| PanelError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> PanelResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| PanelError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| PanelError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Rebase the lock store and user directory under a data directory
    pub fn with_data_dir<P: AsRef<Path>>(mut self, data_dir: P) -> Self {
        let data_dir = data_dir.as_ref();
        self.locks.store_path = data_dir.join("locks").join("active_locks.json");
        self.users.user_dir = data_dir.join("users");
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> PanelResult<()> {
        if self.session.timeout_ms == 0 {
            return Err(crate::config_error!(
                "Session timeout_ms must be greater than 0",
                "Set session.timeout_ms to a positive value"
            ));
        }

        if self.locks.store_path.file_name().is_none() {
            return Err(crate::config_error!(
                "Lock store_path must name a file",
                "Set locks.store_path to e.g. data/locks/active_locks.json"
            ));
        }

        if self.users.user_dir.as_os_str().is_empty() {
            return Err(crate::config_error!(
                "User directory must not be empty",
                "Set users.user_dir to a writable directory"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = PanelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.timeout_ms, 900_000);
        assert!(config.locks.expiry_enabled());
    }

    #[test]
    fn test_zero_session_timeout_rejected() {
        let mut config = PanelConfig::default();
        config.session.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lock_expiry_disabled() {
        let mut settings = LockSettings::default();
        settings.timeout_ms = 0;
        assert!(!settings.expiry_enabled());
        settings.timeout_ms = -5;
        assert!(!settings.expiry_enabled());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("panelguard.toml");

        let mut config = PanelConfig::default().with_data_dir(dir.path());
        config.server.port = 9090;
        config.save_to_file(&path).unwrap();

        let loaded = PanelConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 9090);
        assert_eq!(
            loaded.locks.store_path,
            dir.path().join("locks").join("active_locks.json")
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[locks]\ntimeout_ms = 0\n").unwrap();

        let config = PanelConfig::from_file(&path).unwrap();
        assert!(!config.locks.expiry_enabled());
        assert_eq!(config.session.timeout_ms, DEFAULT_SESSION_TIMEOUT_MS);
    }
}
