// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use thiserror::Error;

/// Error types for GPFS command and parsing operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("command failed: {command} (exit code {exit_code:?}); stderr: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {command} output ({reason}): {line:?}")]
    MalformedOutput {
        command: String,
        line: String,
        reason: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration unavailable at {path:?}: {reason}")]
    ConfigUnavailable { path: PathBuf, reason: String },

    #[error("snapshot {name} already exists on {device}")]
    SnapshotExists { device: String, name: String },
}

impl SysError {
    pub(crate) fn malformed(command: &str, line: &str, reason: impl Into<String>) -> Self {
        Self::MalformedOutput {
            command: command.to_string(),
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for GPFS operations
pub type Result<T> = std::result::Result<T, SysError>;
