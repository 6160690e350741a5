// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the fileset every file system is created with
pub const ROOT_FILESET: &str = "root";

/// A storage pool inside one file system, as listed by `mmlspool`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoragePool {
    pub name: String,
    pub id: u32,
    pub block_size: u64,
    /// Unit of `block_size`, e.g. `KB` or `MB`
    pub block_size_unit: String,
    pub holds_data: bool,
    pub holds_metadata: bool,
    pub data_total_kb: u64,
    pub data_free_kb: u64,
    pub data_free_percent: u8,
    pub meta_total_kb: u64,
    pub meta_free_kb: u64,
    pub meta_free_percent: u8,
}

impl StoragePool {
    /// Block size in bytes, or `None` for an unknown unit.
    pub fn block_size_bytes(&self) -> Option<u64> {
        let factor = match self.block_size_unit.to_ascii_uppercase().as_str() {
            "B" | "" => 1,
            "KB" | "K" => 1024,
            "MB" | "M" => 1024 * 1024,
            "GB" | "G" => 1024 * 1024 * 1024,
            _ => return None,
        };
        self.block_size.checked_mul(factor)
    }
}

/// Whether a fileset owns its own inode space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilesetKind {
    Independent,
    Dependent,
    Unknown,
}

impl FilesetKind {
    /// Classify a fileset from its name and raw `inodeSpace` value.
    ///
    /// The root fileset always owns inode space 0. Any other fileset in
    /// space 0 shares it; a positive space id means it owns a private one.
    pub fn classify(name: &str, inode_space: Option<&str>) -> Self {
        if name == ROOT_FILESET {
            return Self::Independent;
        }

        match inode_space.map(str::trim).and_then(|raw| raw.parse::<i64>().ok()) {
            Some(0) => Self::Dependent,
            Some(space) if space > 0 => Self::Independent,
            _ => Self::Unknown,
        }
    }
}

/// A fileset as listed by `mmlsfileset -Y`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fileset {
    pub name: String,
    pub device: String,
    pub id: Option<u32>,
    pub status: Option<String>,
    pub path: Option<String>,
    pub inode_space: Option<i64>,
    pub comment: Option<String>,
    pub kind: FilesetKind,
    /// Columns without a dedicated field
    pub attributes: BTreeMap<String, String>,
}

impl Fileset {
    pub fn is_independent(&self) -> bool {
        self.kind == FilesetKind::Independent
    }
}

/// A file system device with its configuration, pools and filesets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
    pub device: String,
    /// `mmlsfs` attribute name to value
    pub attributes: BTreeMap<String, String>,
    pub pools: Vec<StoragePool>,
    pub filesets: Vec<Fileset>,
}

impl Filesystem {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn numeric(&self, name: &str) -> Option<u64> {
        self.attribute(name)?.trim().parse().ok()
    }

    pub fn block_size(&self) -> Option<u64> {
        self.numeric("blockSize")
    }

    pub fn default_data_replicas(&self) -> Option<u64> {
        self.numeric("defaultDataReplicas")
    }

    pub fn max_data_replicas(&self) -> Option<u64> {
        self.numeric("maxDataReplicas")
    }

    pub fn default_metadata_replicas(&self) -> Option<u64> {
        self.numeric("defaultMetadataReplicas")
    }

    pub fn max_metadata_replicas(&self) -> Option<u64> {
        self.numeric("maxMetadataReplicas")
    }

    pub fn default_mount_point(&self) -> Option<&str> {
        self.attribute("defaultMountPoint")
    }

    pub fn fileset(&self, name: &str) -> Option<&Fileset> {
        self.filesets.iter().find(|fileset| fileset.name == name)
    }

    pub fn pool(&self, name: &str) -> Option<&StoragePool> {
        self.pools.iter().find(|pool| pool.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_fileset_is_independent() {
        assert_eq!(
            FilesetKind::classify("root", Some("0")),
            FilesetKind::Independent
        );
        assert_eq!(FilesetKind::classify("root", None), FilesetKind::Independent);
    }

    #[test]
    fn non_root_in_space_zero_is_dependent() {
        assert_eq!(
            FilesetKind::classify("projects", Some("0")),
            FilesetKind::Dependent
        );
    }

    #[test]
    fn positive_inode_space_is_independent() {
        assert_eq!(
            FilesetKind::classify("scratch", Some("3")),
            FilesetKind::Independent
        );
    }

    #[test]
    fn unparseable_inode_space_is_unknown() {
        assert_eq!(FilesetKind::classify("home", Some("")), FilesetKind::Unknown);
        assert_eq!(FilesetKind::classify("home", Some("-1")), FilesetKind::Unknown);
        assert_eq!(FilesetKind::classify("home", None), FilesetKind::Unknown);
    }

    #[test]
    fn typed_attribute_accessors() {
        let mut fs = Filesystem {
            device: "gpfs0".to_string(),
            ..Default::default()
        };
        fs.attributes
            .insert("blockSize".to_string(), "4194304".to_string());
        fs.attributes
            .insert("defaultMountPoint".to_string(), "/gpfs/gpfs0".to_string());

        assert_eq!(fs.block_size(), Some(4_194_304));
        assert_eq!(fs.default_mount_point(), Some("/gpfs/gpfs0"));
        assert_eq!(fs.max_data_replicas(), None);
    }

    #[test]
    fn pool_block_size_in_bytes() {
        let pool = StoragePool {
            name: "system".to_string(),
            id: 0,
            block_size: 256,
            block_size_unit: "KB".to_string(),
            holds_data: true,
            holds_metadata: true,
            data_total_kb: 0,
            data_free_kb: 0,
            data_free_percent: 0,
            meta_total_kb: 0,
            meta_free_kb: 0,
            meta_free_percent: 0,
        };
        assert_eq!(pool.block_size_bytes(), Some(256 * 1024));
    }
}
