// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SysError};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/gpfs-snap/config.toml";
pub const DEFAULT_BIN_DIR: &str = "/usr/lpp/mmfs/bin";
pub const DEFAULT_IDENTITY_FILE: &str = "/etc/hostname";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// How much of a freshly built cluster model is dumped to the log
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Quiet,
    /// Cluster attributes and members
    Cluster,
    /// Everything in `Cluster` plus the disk table
    Disks,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GpfsConfig {
    /// Directory holding the `mm*` administration commands
    pub bin_dir: PathBuf,
    /// File whose first line names the local node
    pub identity_file: PathBuf,
    pub snapshot_separator: String,
    /// Snapshots kept by `rotate` when no count is given
    pub keep_count: usize,
    pub log_level: LoggingLevel,
    pub verbosity: Verbosity,
}

impl Default for GpfsConfig {
    fn default() -> Self {
        Self {
            bin_dir: PathBuf::from(DEFAULT_BIN_DIR),
            identity_file: PathBuf::from(DEFAULT_IDENTITY_FILE),
            snapshot_separator: "_".to_string(),
            keep_count: 7,
            log_level: LoggingLevel::Info,
            verbosity: Verbosity::Quiet,
        }
    }
}

/// Config location: `GPFS_SNAP_CONFIG` if set, else the system default.
pub fn config_path() -> PathBuf {
    match std::env::var_os("GPFS_SNAP_CONFIG") {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

impl GpfsConfig {
    /// Load the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(SysError::ConfigUnavailable {
                    path: path.to_path_buf(),
                    reason: error.to_string(),
                });
            }
        };

        Self::parse(&raw, path)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|error| SysError::ConfigUnavailable {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        config
            .validate()
            .map_err(|error| SysError::ConfigUnavailable {
                path: path.to_path_buf(),
                reason: error.to_string(),
            })?;
        Ok(config)
    }

    /// Check values that would only fail later, once a snapshot is named.
    pub fn validate(&self) -> Result<()> {
        let separator = &self.snapshot_separator;
        if separator.is_empty()
            || separator
                .chars()
                .any(|c| c.is_whitespace() || c == ':' || c == '/')
        {
            return Err(SysError::InvalidArgument(format!(
                "snapshot_separator {separator:?} is not usable in a snapshot name"
            )));
        }
        Ok(())
    }
}
