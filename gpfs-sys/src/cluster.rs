// SPDX-License-Identifier: GPL-3.0-only

//! Cluster membership, disk and manager listings
//!
//! `mmlscluster`, `mmlsnsd` and `mmlsmgr` only offer human-oriented tables
//! here, so each one is read through a rule table of line shapes.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use gpfs_types::{Cluster, FilesystemManager, ManagerNode, Managers, Node, Nsd, NsdUsage};
use tracing::{debug, info};

use crate::config::Verbosity;
use crate::error::{Result, SysError};
use crate::escape::strip_noise;
use crate::parse::legacy::{LineRule, Matcher, Tokens, first_match, is_separator, split_servers};

pub const MMLSCLUSTER: &str = "mmlscluster";
pub const MMLSNSD: &str = "mmlsnsd";
pub const MMLSMGR: &str = "mmlsmgr";

#[derive(Debug, Clone, Copy)]
enum ClusterField {
    Name,
    Id,
    UidDomain,
    RemoteShell,
    RemoteCopy,
    Primary,
    Secondary,
}

/// Label substring and the token position of its value
const CLUSTER_RULES: &[LineRule<(ClusterField, usize)>] = &[
    LineRule {
        matcher: Matcher::Contains("GPFS cluster name"),
        action: (ClusterField::Name, 3),
    },
    LineRule {
        matcher: Matcher::Contains("GPFS cluster id"),
        action: (ClusterField::Id, 3),
    },
    LineRule {
        matcher: Matcher::Contains("GPFS UID domain"),
        action: (ClusterField::UidDomain, 3),
    },
    LineRule {
        matcher: Matcher::Contains("Remote shell command"),
        action: (ClusterField::RemoteShell, 3),
    },
    LineRule {
        matcher: Matcher::Contains("Remote file copy command"),
        action: (ClusterField::RemoteCopy, 4),
    },
    LineRule {
        matcher: Matcher::Contains("Primary server"),
        action: (ClusterField::Primary, 2),
    },
    LineRule {
        matcher: Matcher::Contains("Secondary server"),
        action: (ClusterField::Secondary, 2),
    },
];

const NODE_TABLE_TITLE: Matcher = Matcher::ContainsAll(&["Node", "Daemon"]);

/// Parse `mmlscluster` into cluster attributes and members.
///
/// Disks and the manager are filled in by [`build_cluster`].
pub fn parse_cluster(output: &str) -> Result<Cluster> {
    let mut cluster = Cluster::default();
    let mut in_node_table = false;

    for line in output.lines() {
        if line.trim().is_empty() || is_separator(line) {
            continue;
        }

        if in_node_table {
            let node = parse_node_row(line)?;
            if cluster.nodes.insert(node.id, node).is_some() {
                return Err(SysError::malformed(MMLSCLUSTER, line, "duplicate node id"));
            }
            continue;
        }

        if NODE_TABLE_TITLE.matches(line) {
            in_node_table = true;
            continue;
        }

        let Some(&(field, position)) = first_match(CLUSTER_RULES, line) else {
            continue;
        };
        let value = Tokens::new(MMLSCLUSTER, line).get(position)?.to_string();
        match field {
            ClusterField::Name => cluster.name = value,
            ClusterField::Id => cluster.id = value,
            ClusterField::UidDomain => cluster.uid_domain = value,
            ClusterField::RemoteShell => cluster.remote_shell = value,
            ClusterField::RemoteCopy => cluster.remote_copy = value,
            ClusterField::Primary => cluster.primary_server = Some(value),
            ClusterField::Secondary => cluster.secondary_server = Some(value),
        }
    }

    debug!("Parsed cluster {:?} with {} nodes", cluster.name, cluster.nodes.len());
    Ok(cluster)
}

fn parse_node_row(line: &str) -> Result<Node> {
    let tokens = Tokens::new(MMLSCLUSTER, line);
    tokens.require(4)?;

    Ok(Node {
        id: tokens.parse(0, "node id")?,
        daemon_name: tokens.get(1)?.to_string(),
        ip: tokens.get(2)?.to_string(),
        admin_name: tokens.get(3)?.to_string(),
        designation: tokens.optional(4).map(ToString::to_string),
    })
}

#[derive(Debug, Clone, Copy)]
enum DiskUsageColumn {
    Lroc,
    Free,
    Device(usize),
}

#[derive(Debug, Clone, Copy)]
struct DiskColumns {
    usage: DiskUsageColumn,
    name: usize,
    servers: usize,
}

/// `None` marks lines that carry no disk
const NSD_RULES: &[LineRule<Option<DiskColumns>>] = &[
    LineRule {
        matcher: Matcher::Contains("File system"),
        action: None,
    },
    LineRule {
        matcher: Matcher::Contains("(local cache)"),
        action: Some(DiskColumns {
            usage: DiskUsageColumn::Lroc,
            name: 2,
            servers: 3,
        }),
    },
    LineRule {
        matcher: Matcher::Contains("free disk"),
        action: Some(DiskColumns {
            usage: DiskUsageColumn::Free,
            name: 2,
            servers: 3,
        }),
    },
    LineRule {
        matcher: Matcher::Any,
        action: Some(DiskColumns {
            usage: DiskUsageColumn::Device(0),
            name: 1,
            servers: 2,
        }),
    },
];

/// Parsed `mmlsnsd` table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskListing {
    pub nsds: BTreeMap<String, Nsd>,
    /// Every file system device that owns a disk, de-duplicated
    pub devices: BTreeSet<String>,
}

pub fn parse_nsds(output: &str) -> Result<DiskListing> {
    let mut listing = DiskListing::default();

    for line in output.lines() {
        if line.trim().is_empty() || is_separator(line) {
            continue;
        }

        let Some(Some(columns)) = first_match(NSD_RULES, line) else {
            continue;
        };

        let tokens = Tokens::new(MMLSNSD, line);
        let name = tokens.get(columns.name)?.to_string();
        let servers_raw = tokens.get(columns.servers)?;
        // "(directly attached)" disks have no NSD servers
        let servers = if servers_raw.starts_with('(') {
            Vec::new()
        } else {
            split_servers(servers_raw)
        };

        let usage = match columns.usage {
            DiskUsageColumn::Lroc => NsdUsage::Lroc,
            DiskUsageColumn::Free => NsdUsage::Free,
            DiskUsageColumn::Device(position) => {
                let device = tokens.get(position)?.to_string();
                listing.devices.insert(device.clone());
                NsdUsage::Device(device)
            }
        };

        listing.nsds.insert(
            name.clone(),
            Nsd {
                name,
                usage,
                servers,
            },
        );
    }

    debug!(
        "Parsed {} disks across {} file systems",
        listing.nsds.len(),
        listing.devices.len()
    );
    Ok(listing)
}

#[derive(Debug, Clone, Copy)]
enum ManagerLine {
    Title,
    Cluster,
    Unappointed,
    Filesystem,
}

const MANAGER_RULES: &[LineRule<ManagerLine>] = &[
    LineRule {
        matcher: Matcher::Contains("Cluster manager node"),
        action: ManagerLine::Cluster,
    },
    LineRule {
        matcher: Matcher::ContainsAll(&["file system", "manager node"]),
        action: ManagerLine::Title,
    },
    LineRule {
        matcher: Matcher::Contains("(not appointed)"),
        action: ManagerLine::Unappointed,
    },
    LineRule {
        matcher: Matcher::Any,
        action: ManagerLine::Filesystem,
    },
];

/// Parse `mmlsmgr` (or `mmlsmgr -c`, which prints only the cluster manager).
pub fn parse_managers(output: &str) -> Result<Managers> {
    let mut managers = Managers::default();

    for line in output.lines() {
        if line.trim().is_empty() || is_separator(line) {
            continue;
        }

        let Some(kind) = first_match(MANAGER_RULES, line) else {
            continue;
        };

        let stripped = strip_noise(line);
        let tokens = Tokens::new(MMLSMGR, &stripped);
        match kind {
            ManagerLine::Title => {}
            ManagerLine::Cluster => {
                managers.cluster_manager = Some(manager_at(&tokens, 3)?);
            }
            ManagerLine::Unappointed => {
                managers.filesystems.push(FilesystemManager {
                    device: tokens.get(0)?.to_string(),
                    manager: None,
                });
            }
            ManagerLine::Filesystem => {
                managers.filesystems.push(FilesystemManager {
                    device: tokens.get(0)?.to_string(),
                    manager: Some(manager_at(&tokens, 1)?),
                });
            }
        }
    }

    Ok(managers)
}

/// `<ip> <name>` starting at `position`; the address must be a real IP.
fn manager_at(tokens: &Tokens<'_>, position: usize) -> Result<ManagerNode> {
    let ip = tokens.get(position)?;
    if ip.parse::<IpAddr>().is_err() {
        return Err(tokens.malformed(format!("manager address {ip:?} is not an IP address")));
    }
    Ok(ManagerNode {
        ip: ip.to_string(),
        name: tokens.get(position + 1)?.to_string(),
    })
}

/// Assemble a cluster model from the three listings.
///
/// Role resolution against the local node happens separately.
pub fn build_cluster(
    cluster_output: &str,
    nsd_output: &str,
    manager_output: &str,
    verbosity: Verbosity,
) -> Result<Cluster> {
    let mut cluster = parse_cluster(cluster_output)?;
    let disks = parse_nsds(nsd_output)?;
    cluster.nsds = disks.nsds;
    cluster.devices = disks.devices;
    cluster.manager = parse_managers(manager_output)?.cluster_manager;

    dump(&cluster, verbosity);
    Ok(cluster)
}

fn dump(cluster: &Cluster, verbosity: Verbosity) {
    if verbosity >= Verbosity::Cluster {
        info!(
            name = %cluster.name,
            id = %cluster.id,
            uid_domain = %cluster.uid_domain,
            rsh = %cluster.remote_shell,
            rcp = %cluster.remote_copy,
            primary = ?cluster.primary_server,
            secondary = ?cluster.secondary_server,
            manager = ?cluster.manager,
            "Cluster information"
        );
        for node in cluster.nodes.values() {
            info!(
                id = node.id,
                daemon_name = %node.daemon_name,
                ip = %node.ip,
                admin_name = %node.admin_name,
                "Cluster node"
            );
        }
    }

    if verbosity >= Verbosity::Disks {
        for nsd in cluster.nsds.values() {
            info!(
                nsd = %nsd.name,
                usage = %nsd.usage,
                servers = ?nsd.servers,
                "NSD"
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn parses_cluster_attributes() {
        let cluster = parse_cluster(MMLSCLUSTER_OUTPUT).expect("parse");

        assert_eq!(cluster.name, "research.example.com");
        assert_eq!(cluster.id, "723685802921743777");
        assert_eq!(cluster.uid_domain, "research.example.com");
        assert_eq!(cluster.remote_shell, "/usr/bin/ssh");
        assert_eq!(cluster.remote_copy, "/usr/bin/scp");
        assert_eq!(cluster.primary_server.as_deref(), Some("c1n1.example.com"));
        assert_eq!(cluster.secondary_server.as_deref(), Some("c1n2.example.com"));
    }

    #[test]
    fn parses_node_table() {
        let cluster = parse_cluster(MMLSCLUSTER_OUTPUT).expect("parse");

        assert_eq!(cluster.nodes.len(), 3);
        let node = &cluster.nodes[&10];
        assert_eq!(node.daemon_name, "c1n10.example.com");
        assert_eq!(node.ip, "10.0.0.10");
        assert_eq!(node.admin_name, "c1n10.example.com");
        assert_eq!(node.designation, None);
        assert_eq!(cluster.nodes[&1].designation.as_deref(), Some("quorum-manager"));
    }

    #[test]
    fn short_node_row_is_malformed() {
        let output = " Node  Daemon node name  IP address  Admin node name\n----------\n 1 c1n1 10.0.0.1\n";
        let err = parse_cluster(output).expect_err("row is missing admin name");
        assert!(matches!(err, SysError::MalformedOutput { .. }));
    }

    #[test]
    fn duplicate_node_id_is_malformed() {
        let output = " Node  Daemon node name  IP address  Admin node name\n 1 a 10.0.0.1 a\n 1 b 10.0.0.2 b\n";
        assert!(parse_cluster(output).is_err());
    }

    #[test]
    fn classifies_disk_lines() {
        let listing = parse_nsds(MMLSNSD_OUTPUT).expect("parse");

        assert_eq!(listing.nsds.len(), 5);
        assert_eq!(listing.nsds["nsd4"].usage, NsdUsage::Free);
        assert_eq!(listing.nsds["nsd4"].servers, vec!["c1n2.example.com"]);
        assert_eq!(listing.nsds["lroc1"].usage, NsdUsage::Lroc);
        assert_eq!(listing.nsds["nsd1"].usage, NsdUsage::Device("gpfs0".to_string()));
        assert_eq!(
            listing.nsds["nsd2"].servers,
            vec!["c1n2.example.com", "c1n1.example.com"]
        );
    }

    #[test]
    fn collects_devices_once() {
        let listing = parse_nsds(MMLSNSD_OUTPUT).expect("parse");
        let devices: Vec<_> = listing.devices.iter().map(String::as_str).collect();
        assert_eq!(devices, vec!["gpfs0", "scratch"]);
    }

    #[test]
    fn directly_attached_disk_has_no_servers() {
        let listing = parse_nsds(" gpfs1  nsd7  (directly attached)\n").expect("parse");
        assert!(listing.nsds["nsd7"].servers.is_empty());
    }

    #[test]
    fn truncated_disk_line_is_malformed() {
        let err = parse_nsds(" (free disk)   nsd4\n").expect_err("no server column");
        assert!(matches!(err, SysError::MalformedOutput { .. }));
    }

    #[test]
    fn parses_cluster_manager_line() {
        let managers = parse_managers(MMLSMGR_C_OUTPUT).expect("parse");
        assert_eq!(
            managers.cluster_manager,
            Some(ManagerNode {
                name: "c1n1".to_string(),
                ip: "10.0.0.1".to_string(),
            })
        );
        assert!(managers.filesystems.is_empty());
    }

    #[test]
    fn parses_filesystem_managers() {
        let managers = parse_managers(MMLSMGR_OUTPUT).expect("parse");
        assert_eq!(managers.filesystems.len(), 2);
        assert_eq!(managers.filesystems[0].device, "gpfs0");
        assert_eq!(
            managers.filesystems[0].manager.as_ref().map(|m| m.name.as_str()),
            Some("c1n2")
        );
        assert_eq!(
            managers.filesystems[1].manager.as_ref().map(|m| m.ip.as_str()),
            Some("10.0.0.1")
        );
        assert!(managers.cluster_manager.is_some());
    }

    #[test]
    fn unappointed_manager_is_none() {
        let output = "
file system      manager node
---------------- ------------------
gpfs0            10.0.0.2 (c1n2)
gpfs1            (not appointed)
";
        let managers = parse_managers(output).expect("parse");
        assert_eq!(managers.filesystems.len(), 2);
        assert_eq!(managers.filesystems[1].device, "gpfs1");
        assert_eq!(managers.filesystems[1].manager, None);
        assert!(managers.filesystems[0].manager.is_some());
    }

    #[test]
    fn manager_address_must_be_an_ip() {
        let err = parse_managers("gpfs1            pending (c1n2)\n").expect_err("not an address");
        assert!(matches!(err, SysError::MalformedOutput { .. }));

        let err = parse_managers("Cluster manager node: unknown (c1n1)\n").expect_err("not an address");
        assert!(matches!(err, SysError::MalformedOutput { .. }));
    }

    #[test]
    fn builds_full_cluster() {
        let cluster = build_cluster(
            MMLSCLUSTER_OUTPUT,
            MMLSNSD_OUTPUT,
            MMLSMGR_C_OUTPUT,
            Verbosity::Disks,
        )
        .expect("build");

        assert_eq!(cluster.nodes.len(), 3);
        assert_eq!(cluster.nsds.len(), 5);
        assert!(cluster.devices.contains("scratch"));
        assert_eq!(cluster.manager.as_ref().map(|m| m.ip.as_str()), Some("10.0.0.1"));
        assert!(!cluster.local_is_manager);
    }
}
