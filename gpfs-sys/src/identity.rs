// SPDX-License-Identifier: GPL-3.0-only

//! Local node identity and cluster manager role

use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;

use gpfs_types::{Cluster, Node};

use crate::error::{Result, SysError};

/// Tells which cluster node this process runs on.
pub trait NodeIdentity {
    fn local_node_name(&self) -> Result<String>;
}

/// Reads the node name from the first non-comment line of a file.
#[derive(Debug, Clone)]
pub struct HostnameFile {
    path: PathBuf,
}

impl HostnameFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn unavailable(&self, reason: impl Into<String>) -> SysError {
        SysError::ConfigUnavailable {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl NodeIdentity for HostnameFile {
    fn local_node_name(&self) -> Result<String> {
        let content = fs::read_to_string(&self.path)
            .map_err(|error| self.unavailable(error.to_string()))?;

        let line = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .ok_or_else(|| self.unavailable("no node name found"))?;

        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(name), None) => Ok(name.to_string()),
            _ => Err(self.unavailable(format!("expected a single node name, found {line:?}"))),
        }
    }
}

/// A node name supplied directly, e.g. from the command line
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

impl NodeIdentity for StaticIdentity {
    fn local_node_name(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

fn short_name(name: &str) -> &str {
    if name.parse::<IpAddr>().is_ok() {
        return name;
    }
    name.split('.').next().unwrap_or(name)
}

/// Host names refer to the same node when equal, or when one is the first
/// DNS label of the other.
pub fn same_host(a: &str, b: &str) -> bool {
    a == b || short_name(a) == b || a == short_name(b)
}

/// Membership entry of the current cluster manager.
pub fn manager_node(cluster: &Cluster) -> Option<&Node> {
    let manager = cluster.manager.as_ref()?;
    cluster.node_by_ip(&manager.ip).or_else(|| {
        cluster.nodes.values().find(|node| {
            same_host(&node.daemon_name, &manager.name) || same_host(&node.admin_name, &manager.name)
        })
    })
}

/// Whether `local` names the cluster manager node.
pub fn is_local_manager(cluster: &Cluster, local: &str) -> bool {
    match manager_node(cluster) {
        Some(node) => same_host(local, &node.daemon_name) || same_host(local, &node.admin_name),
        None => cluster
            .manager
            .as_ref()
            .is_some_and(|manager| same_host(local, &manager.name)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use gpfs_types::ManagerNode;

    use super::*;
    use crate::cluster::build_cluster;
    use crate::cluster::fixtures::*;
    use crate::config::Verbosity;

    fn cluster() -> Cluster {
        build_cluster(MMLSCLUSTER_OUTPUT, MMLSNSD_OUTPUT, MMLSMGR_C_OUTPUT, Verbosity::Quiet)
            .expect("build")
    }

    #[test]
    fn host_name_matching_is_exact_per_label() {
        assert!(same_host("c1n1", "c1n1.example.com"));
        assert!(same_host("c1n1.example.com", "c1n1"));
        assert!(same_host("c1n1", "c1n1"));
        assert!(!same_host("c1n1", "c1n10.example.com"));
        assert!(!same_host("c1n1.example.com", "c1n1.other.org"));
        assert!(!same_host("10", "10.0.0.1"));
    }

    #[test]
    fn resolves_manager_by_ip() {
        let cluster = cluster();
        assert_eq!(manager_node(&cluster).map(|n| n.id), Some(1));
    }

    #[test]
    fn local_manager_detection() {
        let cluster = cluster();
        assert!(is_local_manager(&cluster, "c1n1"));
        assert!(is_local_manager(&cluster, "c1n1.example.com"));
        assert!(!is_local_manager(&cluster, "c1n10"));
        assert!(!is_local_manager(&cluster, "c1n2"));
    }

    #[test]
    fn falls_back_to_manager_name() {
        let mut cluster = Cluster::default();
        cluster.manager = Some(ManagerNode {
            name: "c9n9".to_string(),
            ip: "10.9.9.9".to_string(),
        });
        assert!(is_local_manager(&cluster, "c9n9.example.com"));
        assert!(!is_local_manager(&Cluster::default(), "c9n9"));
    }

    fn identity_file(content: &str, tag: &str) -> HostnameFile {
        let path = std::env::temp_dir().join(format!(
            "gpfs-snap-identity-{}-{tag}",
            std::process::id()
        ));
        let mut file = fs::File::create(&path).expect("create identity file");
        file.write_all(content.as_bytes()).expect("write identity file");
        HostnameFile::new(path)
    }

    #[test]
    fn reads_first_name_line() {
        let identity = identity_file("# local node\n\nc1n2.example.com\n", "ok");
        assert_eq!(identity.local_node_name().expect("name"), "c1n2.example.com");
    }

    #[test]
    fn rejects_malformed_identity() {
        let identity = identity_file("c1n2 c1n3\n", "bad");
        assert!(matches!(
            identity.local_node_name(),
            Err(SysError::ConfigUnavailable { .. })
        ));
    }

    #[test]
    fn missing_identity_file_is_config_unavailable() {
        let identity = HostnameFile::new("/nonexistent/gpfs-snap/hostname");
        assert!(matches!(
            identity.local_node_name(),
            Err(SysError::ConfigUnavailable { .. })
        ));
    }
}
