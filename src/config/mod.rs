use crate::errors::{AppError, AppResult};
use crate::remote::DEFAULT_PAGE_SIZE;
use crate::sync::SyncConfig;
use crate::utils::path::resolve_in;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_DIR: &str = "rtimetrack";
pub const CONFIG_FILE: &str = "rtimetrack.conf";
pub const DATABASE_FILE: &str = "rtimetrack.sqlite";
pub const REMOTE_FILE: &str = "rtimetrack-remote.sqlite";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local SQLite file holding events and the pending queue.
    pub database: String,
    /// Shared SQLite file acting as the remote store; empty disables syncing.
    #[serde(default)]
    pub remote_database: String,
    /// Identity every remote document is scoped to.
    #[serde(default = "default_owner")]
    pub remote_owner: String,
    /// tracing filter used when RUST_LOG is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Flush the queue at the end of every write command.
    pub auto_flush: bool,
    pub page_size: usize,
    pub flush_interval_secs: u64,
    pub backoff_base_secs: u64,
    pub backoff_max_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_flush: true,
            page_size: DEFAULT_PAGE_SIZE,
            flush_interval_secs: 30,
            backoff_base_secs: 2,
            backoff_max_secs: 300,
        }
    }
}

impl SyncSettings {
    /// Runtime settings for the sync core. Background work stays off: CLI
    /// commands drive flushes explicitly, `sync --watch` starts its own loop.
    pub fn to_sync_config(&self) -> SyncConfig {
        SyncConfig {
            auto_sync: false,
            page_size: self.page_size.max(1),
            flush_interval: Duration::from_secs(self.flush_interval_secs.max(1)),
            backoff_base: Duration::from_secs(self.backoff_base_secs),
            backoff_max: Duration::from_secs(self.backoff_max_secs),
        }
    }
}

fn default_owner() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "local".to_string())
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            remote_database: String::new(),
            remote_owner: default_owner(),
            log_level: default_log_level(),
            sync: SyncSettings::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join(APP_DIR)
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(format!(".{APP_DIR}"))
        }
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join(DATABASE_FILE)
    }

    /// True when a remote store is configured.
    pub fn remote_enabled(&self) -> bool {
        !self.remote_database.trim().is_empty()
    }

    /// Load configuration from file, or defaults if there is none yet.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        let mut file = fs::File::create(path)?;
        file.write_all(yaml.as_bytes())?;
        Ok(())
    }

    /// Build the configuration for `init` and create the config directory.
    ///
    /// Relative database names are placed inside the config directory. In
    /// test mode the config file is not written.
    pub fn init_all(
        custom_db: Option<String>,
        custom_remote: Option<String>,
        is_test: bool,
    ) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let resolve = |name: &str| resolve_in(&dir, name).to_string_lossy().to_string();

        let config = Config {
            database: resolve(custom_db.as_deref().unwrap_or(DATABASE_FILE)),
            remote_database: resolve(custom_remote.as_deref().unwrap_or(REMOTE_FILE)),
            ..Config::default()
        };

        if !is_test {
            config.save_to(&Self::config_file())?;
        }

        Ok(config)
    }
}
