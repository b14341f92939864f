//! Environment-derived configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default `RUST_LOG`-style filter when none is set
pub const DEFAULT_LOG_FILTER: &str = "warn,warroom=info,agent_runtime=info";

/// Default data directory
pub const DEFAULT_DATA_DIR: &str = "data";

/// Settings read from the process environment
///
/// | variable | field |
/// |---|---|
/// | `RUST_LOG` | `log_filter` |
/// | `WARROOM_DATA_DIR` | `data_dir` |
/// | `WARROOM_MODEL` | `model` |
/// | `ANTHROPIC_API_BASE` | `api_base` |
/// | `ANTHROPIC_API_KEY` | presence only, see [`EnvConfig::has_api_key`] |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    pub log_filter: String,
    pub data_dir: PathBuf,
    pub model: Option<String>,
    pub api_base: Option<String>,
    #[serde(skip)]
    has_api_key: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            model: None,
            api_base: None,
            has_api_key: false,
        }
    }
}

impl EnvConfig {
    /// Read from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            log_filter: get("RUST_LOG").unwrap_or(defaults.log_filter),
            data_dir: get("WARROOM_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            model: get("WARROOM_MODEL"),
            api_base: get("ANTHROPIC_API_BASE"),
            has_api_key: get("ANTHROPIC_API_KEY").is_some(),
        }
    }

    /// Whether `ANTHROPIC_API_KEY` was set
    pub fn has_api_key(&self) -> bool {
        self.has_api_key
    }
}
