//! Configuration loading with env-var overrides.
//!
//! Reads a YAML file (an explicit path, or `<config_dir>/tagweave/config.yaml`
//! when present), then applies `TAGWEAVE_DB`, `TAGWEAVE_THRESHOLD` and
//! `TAGWEAVE_LOG` overrides.

use crate::normalize::DEFAULT_SIMILARITY_THRESHOLD;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_DB: &str = "TAGWEAVE_DB";
pub const ENV_THRESHOLD: &str = "TAGWEAVE_THRESHOLD";
pub const ENV_LOG: &str = "TAGWEAVE_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite database file; defaults to the platform data dir
    pub db_path: Option<PathBuf>,
    /// Fuzzy-merge threshold, 0-100
    pub similarity_threshold: u8,
    /// `tracing` level name (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location if it exists, then
    /// apply environment overrides.
    ///
    /// An explicit `path` must exist; a missing default file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.is_file() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw)?;
        config.check()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in `load`)
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(db) = lookup(ENV_DB).filter(|v| !v.is_empty()) {
            self.db_path = Some(PathBuf::from(db));
        }
        if let Some(raw) = lookup(ENV_THRESHOLD).filter(|v| !v.is_empty()) {
            self.similarity_threshold = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_THRESHOLD}={raw} is not a number in 0-100"))
            })?;
        }
        if let Some(level) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
        self.check()
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.similarity_threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold must be at most 100, got {}",
                self.similarity_threshold
            )));
        }
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)))?;
        Ok(())
    }

    /// Configured database path, or `<data_dir>/tagweave/tagweave.db`
    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

/// Get the default database path (~/.local/share/tagweave/tagweave.db)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("tagweave").join("tagweave.db")
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tagweave").join("config.yaml"))
}
