//! Runtime settings: `umpire.toml`, then `UMPIRE_*` environment overrides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing runtime config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Each match gets `<data_dir>/<CODE>/`.
    pub data_dir: PathBuf,
    /// Snapshot every N commands. 0 disables snapshots.
    pub snapshot_interval: u64,
    /// When set, every snapshot is mirrored to `<mirror_dir>/matches/<CODE>.json`.
    pub mirror_dir: Option<PathBuf>,
    /// Extra attempts per sink before a persist failure is reported.
    pub persist_retries: u32,
    /// `EnvFilter` directive installed by `init_tracing`.
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            snapshot_interval: 6,
            mirror_dir: None,
            persist_retries: 2,
            log_filter: "info".into(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load from a file if it exists, otherwise start from defaults.
    /// Environment overrides are applied either way.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml_str(&raw)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse `log_filter` into a subscriber filter.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.log_filter).map_err(|_| ConfigError::Invalid {
            key: "log_filter",
            value: self.log_filter.clone(),
        })
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("UMPIRE_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("UMPIRE_SNAPSHOT_INTERVAL") {
            self.snapshot_interval = v.parse().map_err(|_| ConfigError::Invalid {
                key: "UMPIRE_SNAPSHOT_INTERVAL",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("UMPIRE_MIRROR_DIR") {
            self.mirror_dir = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Some(v) = lookup("UMPIRE_PERSIST_RETRIES") {
            self.persist_retries = v.parse().map_err(|_| ConfigError::Invalid {
                key: "UMPIRE_PERSIST_RETRIES",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("UMPIRE_LOG") {
            self.log_filter = v;
        }
        Ok(())
    }
}
