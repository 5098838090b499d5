use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum config file size (1 MB).
const MAX_CONFIG_BYTES: u64 = 1024 * 1024;

/// Input used when a run or comparison names none.
pub const DEFAULT_INPUT: &str = "Hello, Quantum World!";

fn default_owner() -> String {
    "local".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("pqlab-records.json")
}

fn default_window_days() -> u32 {
    30
}

fn default_input() -> String {
    DEFAULT_INPUT.to_string()
}

fn default_log_filter() -> String {
    "pqlab=info".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabConfig {
    /// Principal that owns every record this process writes.
    #[serde(default = "default_owner")]
    pub owner: String,
    /// JSON record store location. Relative paths resolve against the
    /// config file's directory.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Window for performance and comparison reports without one.
    #[serde(default = "default_window_days")]
    pub default_window_days: u32,
    #[serde(default = "default_input")]
    pub default_input: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            store_path: default_store_path(),
            default_window_days: default_window_days(),
            default_input: default_input(),
            log_filter: default_log_filter(),
        }
    }
}

impl LabConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(p) = path else {
            return Ok(Self::default());
        };
        let mut config: Self =
            serde_json::from_slice(&crate::fs_guard::read_validated(p, MAX_CONFIG_BYTES)?)?;
        if config.store_path.is_relative() {
            if let Some(dir) = p.parent() {
                config.store_path = dir.join(&config.store_path);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            return Err(anyhow!("config: owner must not be empty"));
        }
        if self.default_window_days == 0 {
            return Err(anyhow!("config: default_window_days must be at least 1"));
        }
        Ok(())
    }
}
