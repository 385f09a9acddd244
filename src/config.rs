//! Configuration loaded from TOML.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below.
//!
//! ```toml
//! [storage]
//! path = "data/party.db"
//! cache_capacity = 67108864
//! flush_every_ms = 500
//!
//! [numbering]
//! width = 5
//! overflow = "reject"
//! lock_timeout_ms = 5000
//! durable_commits = true
//!
//! [app]
//! mode = "admin"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::registry::AppMode;
use super::sequence::{NumberFormat, OverflowPolicy};

/// Largest width whose `10^width - 1` still fits a `u64`.
pub const MAX_WIDTH: u32 = 19;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub numbering: NumberingConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub cache_capacity: u64,
    /// `None` disables sled's background flusher.
    pub flush_every_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberingConfig {
    pub width: u32,
    pub overflow: OverflowPolicy,
    pub lock_timeout_ms: u64,
    /// Flush the sequence tree before a generated number is handed out.
    pub durable_commits: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mode: AppMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/party.db"),
            cache_capacity: 64 * 1024 * 1024,
            flush_every_ms: Some(500),
        }
    }
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            width: 5,
            overflow: OverflowPolicy::Reject,
            lock_timeout_ms: 5_000,
            durable_commits: true,
        }
    }
}

impl StorageConfig {
    pub fn open(&self) -> Result<sled::Db> {
        sled::Config::new()
            .path(&self.path)
            .cache_capacity(self.cache_capacity)
            .flush_every_ms(self.flush_every_ms)
            .open()
            .with_context(|| format!("failed to open database at {}", self.path.display()))
    }
}

impl NumberingConfig {
    pub fn number_format(&self) -> NumberFormat {
        NumberFormat::new(self.width, self.overflow)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let width = self.numbering.width;
        if width == 0 || width > MAX_WIDTH {
            anyhow::bail!("numbering.width must be between 1 and {MAX_WIDTH}, got {width}");
        }
        if self.numbering.lock_timeout_ms == 0 {
            anyhow::bail!("numbering.lock_timeout_ms must be greater than zero");
        }
        Ok(())
    }
}
