// SPDX-License-Identifier: GPL-3.0-only

//! GPFS administration commands and their output
//!
//! This crate runs the Spectrum Scale `mm*` commands and turns what they
//! print into the models from `gpfs-types`:
//! - cluster membership, NSDs and managers (`mmlscluster`, `mmlsnsd`, `mmlsmgr`)
//! - file system attributes, storage pools and filesets
//! - snapshot listing, creation, deletion and rotation
//!
//! Commands go through the [`CommandRunner`] seam so everything above it can
//! be exercised with captured output.

pub mod cluster;
pub mod config;
pub mod error;
pub mod escape;
pub mod filesystem;
pub mod identity;
pub mod parse;
pub mod runner;
pub mod snapshot;
pub mod tools;

pub use config::{GpfsConfig, LoggingLevel, Verbosity, config_path};
pub use error::{Result, SysError};
pub use identity::{HostnameFile, NodeIdentity, StaticIdentity, is_local_manager};
pub use runner::{CommandRunner, SystemRunner};
pub use snapshot::{Clock, FixedClock, SystemClock, delete_candidates, snapshot_name};
pub use tools::GpfsTools;
