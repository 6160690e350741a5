// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a network shared disk is currently used for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NsdUsage {
    /// Member of the named file system device
    Device(String),
    /// Not assigned to any file system
    Free,
    /// Local read-only cache disk
    Lroc,
}

impl NsdUsage {
    pub fn device(&self) -> Option<&str> {
        match self {
            Self::Device(name) => Some(name),
            Self::Free | Self::Lroc => None,
        }
    }
}

impl fmt::Display for NsdUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(name) => f.write_str(name),
            Self::Free => f.write_str("free"),
            Self::Lroc => f.write_str("lroc"),
        }
    }
}

/// A network shared disk and the servers that export it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nsd {
    pub name: String,
    pub usage: NsdUsage,
    pub servers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_displays_sentinels() {
        assert_eq!(NsdUsage::Free.to_string(), "free");
        assert_eq!(NsdUsage::Lroc.to_string(), "lroc");
        assert_eq!(NsdUsage::Device("gpfs0".into()).to_string(), "gpfs0");
    }

    #[test]
    fn usage_serializes_snake_case() {
        let json = serde_json::to_string(&NsdUsage::Free).expect("serialize");
        assert_eq!(json, "\"free\"");
    }
}
