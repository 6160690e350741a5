// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot listing, naming and retention
//!
//! Names carry a `CCYYMMDD` date and `HHMM` time so that plain string order
//! is creation order. Retention relies on that: the newest snapshots are the
//! last ones in a [`SnapshotSet`].

use chrono::{Local, NaiveDateTime};
use gpfs_types::{Snapshot, SnapshotSet};

use crate::error::{Result, SysError};
use crate::parse::header::{Column, Columns};
use crate::parse::{SNAPSHOT_LISTING, parse_records};

pub const MMLSSNAPSHOT: &str = "mmlssnapshot";
pub const MMCRSNAPSHOT: &str = "mmcrsnapshot";
pub const MMDELSNAPSHOT: &str = "mmdelsnapshot";

/// Source of the timestamp embedded in new snapshot names.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in local time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Build a snapshot name for `at`.
///
/// An empty `fileset` gives a file system level name `CCYYMMDD<sep>HHMM`,
/// otherwise `<fileset><sep>CCYYMMDD<sep>HHMM`.
pub fn snapshot_name(fileset: &str, at: NaiveDateTime, separator: &str) -> String {
    let stamp = format!(
        "{}{}{}",
        at.format("%Y%m%d"),
        separator,
        at.format("%H%M")
    );
    if fileset.is_empty() {
        stamp
    } else {
        format!("{fileset}{separator}{stamp}")
    }
}

/// Names to delete so that only the newest `keep_count` remain.
///
/// Returned oldest first, in set order. Nothing is deleted here.
pub fn delete_candidates(set: &SnapshotSet, keep_count: usize) -> Vec<String> {
    let names = set.names();
    let total = names.len();
    if total <= keep_count {
        return Vec::new();
    }

    names[..total - keep_count]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SnapshotField {
    Device,
    Name,
    Id,
    Status,
    Created,
    Fileset,
}

const SNAPSHOT_COLUMNS: Columns<SnapshotField> = Columns {
    command: MMLSSNAPSHOT,
    known: &[
        ("filesystemName", Column::Typed(SnapshotField::Device)),
        ("directory", Column::Typed(SnapshotField::Name)),
        ("snapID", Column::Typed(SnapshotField::Id)),
        ("status", Column::Typed(SnapshotField::Status)),
        ("created", Column::Typed(SnapshotField::Created)),
        ("fileset", Column::Typed(SnapshotField::Fileset)),
        ("quotas", Column::Attribute),
        ("data", Column::Attribute),
        ("metadata", Column::Attribute),
        ("snapType", Column::Attribute),
        ("expirationTime", Column::Attribute),
    ],
    known_prefixes: &[],
};

/// Parse `mmlssnapshot <device> -Y` and keep the snapshots of `fileset`.
///
/// An empty `fileset` selects file system level snapshots.
pub fn parse_snapshots(device: &str, fileset: &str, output: &str) -> Result<SnapshotSet> {
    let records = parse_records(&SNAPSHOT_LISTING, output)?;
    SNAPSHOT_COLUMNS.warn_unrecognized(&records);

    let mut snapshots = Vec::new();
    for record in records {
        let mut bound = SNAPSHOT_COLUMNS.bind(record);
        let Some(name) = bound.take_non_empty(SnapshotField::Name) else {
            return Err(SysError::malformed(MMLSSNAPSHOT, "", "record without directory"));
        };
        let owner = bound.take(SnapshotField::Fileset).unwrap_or_default();
        if owner != fileset {
            continue;
        }

        snapshots.push(Snapshot {
            name,
            device: bound
                .take_non_empty(SnapshotField::Device)
                .unwrap_or_else(|| device.to_string()),
            fileset: owner,
            id: bound
                .take(SnapshotField::Id)
                .and_then(|raw| raw.trim().parse().ok()),
            status: bound.take_non_empty(SnapshotField::Status),
            created: bound.take_non_empty(SnapshotField::Created),
            attributes: bound.attributes,
        });
    }

    Ok(SnapshotSet::new(device, fileset, snapshots))
}

/// Reject names GPFS would misread before any command runs.
pub(crate) fn validate_name(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SysError::InvalidArgument(format!("{kind} must not be empty")));
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || c == ':' || c == '/')
    {
        return Err(SysError::InvalidArgument(format!(
            "{kind} {value:?} contains whitespace, ':' or '/'"
        )));
    }
    Ok(())
}

/// Like [`validate_name`] but an empty fileset means the whole file system.
pub(crate) fn validate_fileset(fileset: &str) -> Result<()> {
    if fileset.is_empty() {
        return Ok(());
    }
    validate_name("fileset name", fileset)
}

/// Arguments for `mmcrsnapshot` / `mmdelsnapshot`
pub(crate) fn snapshot_args(device: &str, fileset: &str, name: &str) -> Vec<String> {
    let mut args = vec![device.to_string(), name.to_string()];
    if !fileset.is_empty() {
        args.push("-j".to_string());
        args.push(fileset.to_string());
    }
    args
}
