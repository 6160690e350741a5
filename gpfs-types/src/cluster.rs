// SPDX-License-Identifier: GPL-3.0-only

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::nsd::Nsd;

/// A cluster member as listed by `mmlscluster`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub daemon_name: String,
    pub ip: String,
    pub admin_name: String,
    /// `quorum`, `manager`, `quorum-manager`; absent for client nodes
    pub designation: Option<String>,
}

/// The node currently acting as a manager, as reported by `mmlsmgr`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerNode {
    pub name: String,
    pub ip: String,
}

/// File system manager assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemManager {
    pub device: String,
    /// `None` when no manager is appointed, e.g. the file system is not mounted
    pub manager: Option<ManagerNode>,
}

/// Full `mmlsmgr` result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Managers {
    pub cluster_manager: Option<ManagerNode>,
    pub filesystems: Vec<FilesystemManager>,
}

/// Point-in-time view of the cluster configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub id: String,
    pub uid_domain: String,
    pub remote_shell: String,
    pub remote_copy: String,
    pub primary_server: Option<String>,
    pub secondary_server: Option<String>,

    /// Members keyed by node id
    pub nodes: BTreeMap<u32, Node>,

    /// Network shared disks keyed by disk name
    pub nsds: BTreeMap<String, Nsd>,

    /// File system devices that own at least one disk
    pub devices: BTreeSet<String>,

    pub manager: Option<ManagerNode>,
    pub local_is_manager: bool,
}

impl Cluster {
    /// Look up a member by daemon or admin node name.
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes
            .values()
            .find(|node| node.daemon_name == name || node.admin_name == name)
    }

    pub fn node_by_ip(&self, ip: &str) -> Option<&Node> {
        self.nodes.values().find(|node| node.ip == ip)
    }

    /// Disks that belong to `device`, in name order.
    pub fn disks_of<'a>(&'a self, device: &'a str) -> impl Iterator<Item = &'a Nsd> + 'a {
        self.nsds
            .values()
            .filter(move |nsd| nsd.usage.device() == Some(device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nsd::NsdUsage;

    fn node(id: u32, name: &str, ip: &str) -> Node {
        Node {
            id,
            daemon_name: name.to_string(),
            ip: ip.to_string(),
            admin_name: name.to_string(),
            designation: None,
        }
    }

    #[test]
    fn finds_nodes_by_name_and_ip() {
        let mut cluster = Cluster::default();
        cluster.nodes.insert(1, node(1, "c1n1", "10.0.0.1"));
        cluster.nodes.insert(2, node(2, "c1n2", "10.0.0.2"));

        assert_eq!(cluster.node_by_name("c1n2").map(|n| n.id), Some(2));
        assert_eq!(cluster.node_by_ip("10.0.0.1").map(|n| n.id), Some(1));
        assert!(cluster.node_by_name("c1n3").is_none());
    }

    #[test]
    fn lists_disks_of_device() {
        let mut cluster = Cluster::default();
        for (name, usage) in [
            ("nsd1", NsdUsage::Device("gpfs0".to_string())),
            ("nsd2", NsdUsage::Free),
            ("nsd3", NsdUsage::Device("gpfs0".to_string())),
        ] {
            cluster.nsds.insert(
                name.to_string(),
                Nsd {
                    name: name.to_string(),
                    usage,
                    servers: vec![],
                },
            );
        }

        let names: Vec<_> = cluster.disks_of("gpfs0").map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["nsd1", "nsd3"]);
    }
}
