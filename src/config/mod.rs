use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    errors::TrackerError,
    utils::fs::replace_file,
};

const DEFAULT_DIR_NAME: &str = ".finance_core";
const HOME_ENV: &str = "FINANCE_CORE_HOME";
const CONFIG_FILE: &str = "config.json";
const DATA_DIR: &str = "data";

/// Stores user preferences plus the storage limits the transaction store enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub currency: String,
    pub locale: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub auto_backup: bool,
    #[serde(default)]
    pub storage: StorageLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            locale: "en-US".into(),
            theme: Theme::default(),
            auto_backup: false,
            storage: StorageLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Retention knobs for backups and the quota remediation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLimits {
    /// Backups kept on every normal backup write.
    pub backup_retention: usize,
    /// Backups kept after a capacity failure.
    pub emergency_backup_retention: usize,
    /// Most-recent transactions kept when history must be truncated to reclaim space.
    pub history_cap: usize,
}

impl Default for StorageLimits {
    fn default() -> Self {
        Self {
            backup_retention: 10,
            emergency_backup_retention: 5,
            history_cap: 1000,
        }
    }
}

/// Loads and saves [`Config`] as JSON under a base directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    /// Uses `FINANCE_CORE_HOME` or `~/.finance_core`.
    pub fn new() -> Result<Self, TrackerError> {
        Self::with_base_dir(resolve_base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, TrackerError> {
        fs::create_dir_all(&base)
            .map_err(|err| TrackerError::Config(format!("{}: {err}", base.display())))?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
            base,
        })
    }

    pub fn load(&self) -> Result<Config, TrackerError> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            TrackerError::Config(format!("{} is not valid: {err}", self.path.display()))
        })
    }

    pub fn save(&self, config: &Config) -> Result<(), TrackerError> {
        let json = serde_json::to_string_pretty(config)?;
        replace_file(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory handed to file-backed key-value stores.
    pub fn data_dir(&self) -> PathBuf {
        self.base.join(DATA_DIR)
    }
}

/// Returns the application data directory, defaulting to `~/.finance_core`.
pub fn resolve_base_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}
