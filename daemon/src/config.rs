//! Daemon configuration with TOML file support.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use runoff_types::{Identity, RunoffParams};
use runoff_utils::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("no administrator configured (set `admin` or pass --admin)")]
    MissingAdmin,

    #[error("map size must be at least 1 MiB")]
    MapSizeTooSmall,
}

/// Configuration for the runoff daemon.
///
/// Every field has a default, so an empty file is valid; `admin` must still
/// come from somewhere before the ledger can be opened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// The ledger administrator. Fixed the first time a data directory is opened.
    #[serde(default)]
    pub admin: Option<Identity>,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Delay between finalizing a tied election and its runoff opening.
    #[serde(default = "default_runoff_cooldown_secs")]
    pub runoff_cooldown_secs: u64,

    #[serde(default = "default_runoff_title_suffix")]
    pub runoff_title_suffix: String,

    /// Log filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./runoff_data")
}

fn default_map_size_mb() -> usize {
    64
}

fn default_rpc_port() -> u16 {
    7090
}

fn default_runoff_cooldown_secs() -> u64 {
    RunoffParams::DEFAULT_COOLDOWN_SECS
}

fn default_runoff_title_suffix() -> String {
    RunoffParams::DEFAULT_TITLE_SUFFIX.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn runoff_params(&self) -> RunoffParams {
        RunoffParams {
            cooldown_secs: self.runoff_cooldown_secs,
            title_suffix: self.runoff_title_suffix.clone(),
        }
    }

    pub fn map_size_bytes(&self) -> Result<usize, ConfigError> {
        if self.map_size_mb == 0 {
            return Err(ConfigError::MapSizeTooSmall);
        }
        Ok(self.map_size_mb.saturating_mul(1024 * 1024))
    }

    pub fn require_admin(&self) -> Result<&Identity, ConfigError> {
        self.admin.as_ref().ok_or(ConfigError::MissingAdmin)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            admin: None,
            map_size_mb: default_map_size_mb(),
            rpc_port: default_rpc_port(),
            runoff_cooldown_secs: default_runoff_cooldown_secs(),
            runoff_title_suffix: default_runoff_title_suffix(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}
