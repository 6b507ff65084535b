use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::ConfigError;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_VAR: &str = "LOG_SERVICE_CONFIG";

/// Environment variable overriding `table_name`.
pub const TABLE_NAME_VAR: &str = "TABLE_NAME";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Name of the log table. Required, either here or via `TABLE_NAME`.
    #[serde(default)]
    pub table_name: Option<String>,

    /// Directory holding the table snapshot.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Interval (seconds) between automatic snapshot saves.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,

    pub server_version: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_snapshot_interval() -> u64 {
    30
}

impl AppConfig {
    /// Parse a config document and apply the table name override.
    pub fn from_json(text: &str, table_override: Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = serde_json::from_str::<AppConfig>(text)?;

        if let Some(name) = table_override.filter(|n| !n.trim().is_empty()) {
            cfg.table_name = Some(name);
        }

        match cfg.table_name.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(cfg),
            _ => Err(ConfigError::MissingTableName),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&text, env::var(TABLE_NAME_VAR).ok())
    }

    /// Find config.json: `LOG_SERVICE_CONFIG` if set, otherwise next to the
    /// executable or one directory above it.
    pub fn locate() -> Result<PathBuf, ConfigError> {
        if let Ok(explicit) = env::var(CONFIG_PATH_VAR) {
            return Ok(PathBuf::from(explicit));
        }

        let exe_path = env::current_exe().map_err(ConfigError::ExecutablePath)?;
        let exe_dir = exe_path.parent().unwrap_or_else(|| Path::new("."));

        let primary = exe_dir.join("config.json");
        if primary.exists() {
            return Ok(primary);
        }

        let fallback = exe_dir.join("..").join("config.json");
        if fallback.exists() {
            return Ok(fallback);
        }

        Err(ConfigError::NotFound { primary, fallback })
    }

    /// Configured table name. Guaranteed non-empty after loading.
    pub fn table_name(&self) -> &str {
        self.table_name.as_deref().unwrap_or_default()
    }

    /// Snapshot file for the configured table.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.table_name()))
    }
}
