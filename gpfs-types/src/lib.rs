// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the GPFS cluster toolkit
//!
//! Every type here is a plain owned value. Models are rebuilt wholesale from
//! command output on each refresh and never merged with an earlier copy.
//!
//! - **gpfs-sys**: parses command output into these types
//! - **gpfs-cli**: serializes them as JSON

pub mod cluster;
pub mod filesystem;
pub mod nsd;
pub mod snapshot;

pub use cluster::{Cluster, FilesystemManager, ManagerNode, Managers, Node};
pub use filesystem::{Filesystem, Fileset, FilesetKind, StoragePool};
pub use nsd::{Nsd, NsdUsage};
pub use snapshot::{Snapshot, SnapshotSet};
