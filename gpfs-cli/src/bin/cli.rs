// SPDX-License-Identifier: GPL-3.0-only

//! Inspect a GPFS cluster and rotate its snapshots

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gpfs_sys::{
    Clock, CommandRunner, GpfsConfig, GpfsTools, NodeIdentity, StaticIdentity, SystemClock,
    SystemRunner, config_path,
};
use gpfs_types::SnapshotSet;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gpfs-snap")]
#[command(about = "GPFS cluster inspection and snapshot rotation", long_about = None)]
struct Cli {
    /// Configuration file (defaults to $GPFS_SNAP_CONFIG or /etc/gpfs-snap/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Local node name, instead of reading the identity file
    #[arg(long, global = true)]
    node: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cluster membership, disks and the manager role of this node
    Cluster,
    /// Show file system attributes, storage pools and filesets
    Filesystem {
        /// File system device name
        device: String,
    },
    /// List snapshots, oldest first
    Snapshots {
        device: String,
        /// Fileset whose snapshots to list (file system level when omitted)
        #[arg(long, short = 'j', default_value = "")]
        fileset: String,
    },
    /// Create a snapshot named after the current time
    Create {
        device: String,
        #[arg(long, short = 'j', default_value = "")]
        fileset: String,
    },
    /// Delete one snapshot
    Delete {
        device: String,
        /// Snapshot name
        name: String,
        #[arg(long, short = 'j', default_value = "")]
        fileset: String,
    },
    /// Show which snapshots a rotation would delete
    Candidates {
        device: String,
        #[arg(long, short = 'j', default_value = "")]
        fileset: String,
        /// Snapshots to keep (defaults to keep_count from the config)
        #[arg(long)]
        keep: Option<usize>,
    },
    /// Delete all but the newest snapshots
    Rotate {
        device: String,
        #[arg(long, short = 'j', default_value = "")]
        fileset: String,
        /// Snapshots to keep (defaults to keep_count from the config)
        #[arg(long)]
        keep: Option<usize>,
    },
    /// Show the cluster manager and file system managers
    Managers,
}

#[derive(Serialize)]
struct CandidateReport<'a> {
    #[serde(flatten)]
    set: &'a SnapshotSet,
    keep: usize,
    delete: Vec<String>,
}

#[derive(Serialize)]
struct Done<'a> {
    success: bool,
    snapshot: &'a str,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

fn execute<R, C, I>(tools: &GpfsTools<R, C, I>, command: Commands) -> Result<()>
where
    R: CommandRunner,
    C: Clock,
    I: NodeIdentity,
{
    let default_keep = tools.config().keep_count;

    match command {
        Commands::Cluster => {
            print_json(&tools.load_cluster()?)?;
        }
        Commands::Filesystem { device } => {
            let filesystem = tools
                .load_filesystem(&device)
                .with_context(|| format!("Failed to load file system {device}"))?;
            print_json(&filesystem)?;
        }
        Commands::Snapshots { device, fileset } => {
            print_json(&tools.load_snapshots(&device, &fileset)?)?;
        }
        Commands::Create { device, fileset } => {
            let name = tools.create_snapshot(&device, &fileset)?;
            print_json(&Done {
                success: true,
                snapshot: &name,
            })?;
        }
        Commands::Delete {
            device,
            name,
            fileset,
        } => {
            tools.delete_snapshot(&device, &fileset, &name)?;
            print_json(&Done {
                success: true,
                snapshot: &name,
            })?;
        }
        Commands::Candidates {
            device,
            fileset,
            keep,
        } => {
            let keep = keep.unwrap_or(default_keep);
            let set = tools.load_snapshots(&device, &fileset)?;
            let delete = tools.delete_candidates(&set, keep);
            print_json(&CandidateReport {
                set: &set,
                keep,
                delete,
            })?;
        }
        Commands::Rotate {
            device,
            fileset,
            keep,
        } => {
            let keep = keep.unwrap_or(default_keep);
            let deleted = tools
                .rotate(&device, &fileset, keep)
                .with_context(|| format!("Snapshot rotation on {device} failed"))?;
            print_json(&deleted)?;
        }
        Commands::Managers => {
            print_json(&tools.load_managers()?)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli.config.unwrap_or_else(config_path);
    let config = GpfsConfig::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    // Initialize tracing to stderr, RUST_LOG overrides the configured level
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_directive())),
        )
        .init();
    debug!("Using configuration {}", path.display());

    match cli.node {
        Some(node) => {
            let runner = SystemRunner::new(config.bin_dir.clone());
            let tools = GpfsTools::new(config, runner, SystemClock, StaticIdentity(node))?;
            execute(&tools, cli.command)
        }
        None => execute(&GpfsTools::from_config(config)?, cli.command),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_line_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_rotation_arguments() {
        let cli = Cli::try_parse_from(["gpfs-snap", "rotate", "gpfs0", "-j", "home", "--keep", "3"])
            .expect("valid arguments");
        match cli.command {
            Commands::Rotate {
                device,
                fileset,
                keep,
            } => {
                assert_eq!(device, "gpfs0");
                assert_eq!(fileset, "home");
                assert_eq!(keep, Some(3));
            }
            _ => panic!("expected rotate"),
        }
    }

    #[test]
    fn fileset_defaults_to_file_system_level() {
        let cli = Cli::try_parse_from(["gpfs-snap", "--node", "c1n1", "snapshots", "gpfs0"])
            .expect("valid arguments");
        assert_eq!(cli.node.as_deref(), Some("c1n1"));
        assert!(matches!(cli.command, Commands::Snapshots { ref fileset, .. } if fileset.is_empty()));
    }
}
