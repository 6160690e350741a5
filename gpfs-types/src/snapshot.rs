// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A global or fileset snapshot as listed by `mmlssnapshot -Y`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    pub device: String,
    /// Empty for file system level snapshots
    pub fileset: String,
    pub id: Option<u32>,
    pub status: Option<String>,
    pub created: Option<String>,
    /// Columns without a dedicated field
    pub attributes: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn is_global(&self) -> bool {
        self.fileset.is_empty()
    }
}

/// Snapshots of one (device, fileset) pair, ordered by name
///
/// Snapshot names embed a `CCYYMMDD` / `HHMM` stamp, so name order is
/// creation order and the last entries are the newest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UnsortedSet")]
pub struct SnapshotSet {
    pub device: String,
    pub fileset: String,
    snapshots: Vec<Snapshot>,
}

/// Wire shape of a [`SnapshotSet`] before ordering is restored
#[derive(Deserialize)]
struct UnsortedSet {
    device: String,
    fileset: String,
    snapshots: Vec<Snapshot>,
}

impl From<UnsortedSet> for SnapshotSet {
    fn from(raw: UnsortedSet) -> Self {
        Self::new(raw.device, raw.fileset, raw.snapshots)
    }
}

impl SnapshotSet {
    pub fn new(
        device: impl Into<String>,
        fileset: impl Into<String>,
        mut snapshots: Vec<Snapshot>,
    ) -> Self {
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            device: device.into(),
            fileset: fileset.into(),
            snapshots,
        }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn names(&self) -> Vec<&str> {
        self.snapshots.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshots
            .binary_search_by(|s| s.name.as_str().cmp(name))
            .is_ok()
    }

    pub fn newest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
