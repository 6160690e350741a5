// SPDX-License-Identifier: GPL-3.0-only

//! Entry point for everything that talks to GPFS
//!
//! [`GpfsTools`] runs the `mm*` commands through a [`CommandRunner`], feeds
//! their output to the parsers and returns freshly built models. It keeps no
//! state between calls besides its configuration.

use gpfs_types::{Cluster, Filesystem, Managers, SnapshotSet};
use tracing::{debug, info, warn};

use crate::cluster::{MMLSCLUSTER, MMLSMGR, MMLSNSD, build_cluster, parse_managers};
use crate::config::GpfsConfig;
use crate::error::{Result, SysError};
use crate::filesystem::{MMLSFILESET, MMLSFS, MMLSPOOL, build_filesystem};
use crate::identity::{HostnameFile, NodeIdentity, is_local_manager};
use crate::parse::SNAPSHOT_LISTING;
use crate::runner::{CommandRunner, SystemRunner};
use crate::snapshot::{
    self, Clock, MMCRSNAPSHOT, MMDELSNAPSHOT, MMLSSNAPSHOT, SystemClock, parse_snapshots,
    snapshot_args, snapshot_name, validate_fileset, validate_name,
};

/// GPFS command wrapper
pub struct GpfsTools<R, C = SystemClock, I = HostnameFile> {
    config: GpfsConfig,
    runner: R,
    clock: C,
    identity: I,
}

impl GpfsTools<SystemRunner> {
    /// Wire up the real binaries, wall clock and identity file from `config`.
    pub fn from_config(config: GpfsConfig) -> Result<Self> {
        let runner = SystemRunner::new(config.bin_dir.clone());
        let identity = HostnameFile::new(config.identity_file.clone());
        Self::new(config, runner, SystemClock, identity)
    }
}

impl<R, C, I> GpfsTools<R, C, I>
where
    R: CommandRunner,
    C: Clock,
    I: NodeIdentity,
{
    /// Fails with `InvalidArgument` when `config` could not name snapshots.
    pub fn new(config: GpfsConfig, runner: R, clock: C, identity: I) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            runner,
            clock,
            identity,
        })
    }

    pub fn config(&self) -> &GpfsConfig {
        &self.config
    }

    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.runner.run(program, &args)
    }

    /// Build the cluster model and decide whether this node is the manager.
    ///
    /// A missing or unreadable identity file only costs the role: the model
    /// is still returned with `local_is_manager` unset.
    pub fn load_cluster(&self) -> Result<Cluster> {
        let cluster_output = self.run(MMLSCLUSTER, &[])?;
        let nsd_output = self.run(MMLSNSD, &[])?;
        let manager_output = self.run(MMLSMGR, &["-c"])?;

        let mut cluster = build_cluster(
            &cluster_output,
            &nsd_output,
            &manager_output,
            self.config.verbosity,
        )?;

        cluster.local_is_manager = match self.identity.local_node_name() {
            Ok(local) => {
                let is_manager = is_local_manager(&cluster, &local);
                debug!("Local node {} is cluster manager: {}", local, is_manager);
                is_manager
            }
            Err(error) => {
                warn!("Cannot determine the local node, assuming it is not the cluster manager: {error}");
                false
            }
        };

        Ok(cluster)
    }

    pub fn load_filesystem(&self, device: &str) -> Result<Filesystem> {
        validate_name("device", device)?;

        let attributes = self.run(MMLSFS, &[device, "-Y"])?;
        let pools = self.run(MMLSPOOL, &[device])?;
        let filesets = self.run(MMLSFILESET, &[device, "-Y"])?;

        build_filesystem(device, &attributes, &pools, &filesets)
    }

    /// Snapshots of `fileset` on `device`; an empty fileset selects the
    /// file system level ones.
    pub fn load_snapshots(&self, device: &str, fileset: &str) -> Result<SnapshotSet> {
        validate_name("device", device)?;
        validate_fileset(fileset)?;

        let output = match self.run(MMLSSNAPSHOT, &[device, "-Y"]) {
            Ok(output) => output,
            Err(SysError::CommandFailed { stderr, .. }) if is_no_snapshots(&stderr) => {
                debug!("No snapshots on {}", device);
                return Ok(SnapshotSet::new(device, fileset, Vec::new()));
            }
            Err(error) => return Err(error),
        };

        let set = parse_snapshots(device, fileset, &output)?;
        debug!(
            "Found {} snapshots on {} (fileset {:?})",
            set.len(),
            device,
            fileset
        );
        Ok(set)
    }

    pub fn load_managers(&self) -> Result<Managers> {
        let output = self.run(MMLSMGR, &[])?;
        parse_managers(&output)
    }

    /// Create a snapshot named after the current time and return its name.
    pub fn create_snapshot(&self, device: &str, fileset: &str) -> Result<String> {
        validate_name("device", device)?;
        validate_fileset(fileset)?;

        let name = snapshot_name(fileset, self.clock.now(), &self.config.snapshot_separator);
        let existing = self.load_snapshots(device, fileset)?;
        if existing.contains(&name) {
            return Err(SysError::SnapshotExists {
                device: device.to_string(),
                name,
            });
        }

        self.runner
            .run(MMCRSNAPSHOT, &snapshot_args(device, fileset, &name))?;
        info!(device, fileset, snapshot = %name, "Created snapshot");
        Ok(name)
    }

    pub fn delete_snapshot(&self, device: &str, fileset: &str, name: &str) -> Result<()> {
        validate_name("device", device)?;
        validate_fileset(fileset)?;
        validate_name("snapshot name", name)?;

        self.runner
            .run(MMDELSNAPSHOT, &snapshot_args(device, fileset, name))?;
        info!(device, fileset, snapshot = %name, "Deleted snapshot");
        Ok(())
    }

    pub fn delete_candidates(&self, set: &SnapshotSet, keep_count: usize) -> Vec<String> {
        snapshot::delete_candidates(set, keep_count)
    }

    /// Delete all but the newest `keep_count` snapshots, oldest first.
    ///
    /// Names that cannot be passed to `mmdelsnapshot` (created by hand with
    /// `:` or whitespace) are skipped with a warning. Stops at the first
    /// failed delete and returns that error; the snapshots removed before it
    /// are logged.
    pub fn rotate(&self, device: &str, fileset: &str, keep_count: usize) -> Result<Vec<String>> {
        let set = self.load_snapshots(device, fileset)?;
        let candidates = self.delete_candidates(&set, keep_count);
        if candidates.is_empty() {
            debug!(
                "{} snapshots on {} within keep count {}",
                set.len(),
                device,
                keep_count
            );
            return Ok(candidates);
        }

        let mut deleted = Vec::with_capacity(candidates.len());
        for name in candidates {
            if let Err(error) = validate_name("snapshot name", &name) {
                warn!(device, fileset, snapshot = %name, "Skipping snapshot: {error}");
                continue;
            }
            if let Err(error) = self.delete_snapshot(device, fileset, &name) {
                warn!(
                    device,
                    fileset,
                    deleted = ?deleted,
                    "Rotation stopped at {}",
                    name
                );
                return Err(error);
            }
            deleted.push(name);
        }

        info!(device, fileset, count = deleted.len(), "Rotated snapshots");
        Ok(deleted)
    }
}

fn is_no_snapshots(stderr: &str) -> bool {
    SNAPSHOT_LISTING
        .empty_sentinel
        .is_some_and(|sentinel| stderr.contains(sentinel))
}
