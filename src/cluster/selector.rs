//! Node selection policy
//!
//! Write-affecting commands prefer the current leader when one is known
//! and not excluded. Everything else (and writes with no usable leader)
//! falls back to the first non-excluded node in topology order.

use std::collections::HashSet;

use crate::cluster::topology::{ClusterTopology, ServerNode};
use crate::common::{Error, Result};

/// Pick a target node, skipping nodes that already failed in this call.
///
/// `Error::NoNodeAvailable` signals the executor to refresh the
/// topology before giving up.
pub fn choose_node(
    topology: &ClusterTopology,
    excluded: &HashSet<String>,
    prefer_leader: bool,
) -> Result<ServerNode> {
    if topology.is_empty() {
        return Err(Error::NoNodeAvailable("topology is empty".into()));
    }

    if prefer_leader {
        if let Some(leader) = topology.leader() {
            if !excluded.contains(&leader.url) {
                return Ok(leader.clone());
            }
        }
    }

    topology
        .nodes
        .iter()
        .find(|n| !excluded.contains(&n.url))
        .cloned()
        .ok_or_else(|| {
            Error::NoNodeAvailable(format!(
                "all {} topology nodes excluded",
                topology.nodes.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(url: &str, is_leader: bool) -> ServerNode {
        ServerNode {
            url: url.into(),
            tag: String::new(),
            is_leader,
        }
    }

    fn three_nodes() -> ClusterTopology {
        ClusterTopology::new(
            1,
            vec![
                node("http://a:8080", false),
                node("http://b:8080", true),
                node("http://c:8080", false),
            ],
        )
    }

    #[test]
    fn test_writes_prefer_leader() {
        let topo = three_nodes();
        let chosen = choose_node(&topo, &HashSet::new(), true).unwrap();
        assert_eq!(chosen.url, "http://b:8080");
    }

    #[test]
    fn test_reads_take_first_in_topology_order() {
        let topo = three_nodes();
        let chosen = choose_node(&topo, &HashSet::new(), false).unwrap();
        assert_eq!(chosen.url, "http://a:8080");
    }

    #[test]
    fn test_excluded_leader_falls_back() {
        let topo = three_nodes();
        let excluded: HashSet<String> = ["http://b:8080".to_string()].into();
        let chosen = choose_node(&topo, &excluded, true).unwrap();
        assert_eq!(chosen.url, "http://a:8080");
    }

    #[test]
    fn test_exclusion_walks_topology_order() {
        let topo = three_nodes();
        let excluded: HashSet<String> =
            ["http://a:8080".to_string(), "http://b:8080".to_string()].into();
        let chosen = choose_node(&topo, &excluded, false).unwrap();
        assert_eq!(chosen.url, "http://c:8080");
    }

    #[test]
    fn test_no_node_available() {
        let topo = three_nodes();
        let excluded: HashSet<String> = topo.nodes.iter().map(|n| n.url.clone()).collect();
        assert!(matches!(
            choose_node(&topo, &excluded, false),
            Err(Error::NoNodeAvailable(_))
        ));

        let empty = ClusterTopology::new(0, vec![]);
        assert!(matches!(
            choose_node(&empty, &HashSet::new(), true),
            Err(Error::NoNodeAvailable(_))
        ));
    }
}
