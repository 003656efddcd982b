//! Cluster topology snapshot
//!
//! A topology is the set of cluster nodes plus a monotonically
//! increasing etag. Snapshots are immutable: a refresh replaces the
//! whole value, never patches fields in place.

use serde::{Deserialize, Serialize};

use crate::common::normalize_url;

/// A single cluster node. Stateless beyond its membership in one
/// topology snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerNode {
    /// Base url, no trailing slash
    pub url: String,

    /// Short cluster tag assigned by the server (e.g. "A")
    #[serde(default)]
    pub tag: String,

    /// Is this node the current cluster leader?
    #[serde(default)]
    pub is_leader: bool,
}

impl ServerNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: normalize_url(&url.into()),
            tag: String::new(),
            is_leader: false,
        }
    }
}

/// Versioned, ordered set of cluster nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopology {
    pub etag: i64,
    pub nodes: Vec<ServerNode>,
}

impl ClusterTopology {
    pub fn new(etag: i64, nodes: Vec<ServerNode>) -> Self {
        Self { etag, nodes }
    }

    /// The node currently marked leader, if any.
    pub fn leader(&self) -> Option<&ServerNode> {
        self.nodes.iter().find(|n| n.is_leader)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Normalize node urls after decoding a server response.
    pub fn normalized(mut self) -> Self {
        for node in &mut self.nodes {
            node.url = normalize_url(&node.url);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leader_lookup() {
        let topo = ClusterTopology::new(
            7,
            vec![
                ServerNode::new("http://a:8080"),
                ServerNode {
                    url: "http://b:8080".into(),
                    tag: "B".into(),
                    is_leader: true,
                },
            ],
        );
        assert_eq!(topo.leader().unwrap().url, "http://b:8080");
    }

    #[test]
    fn test_decode_and_normalize() {
        let json = r#"{"etag": 3, "nodes": [{"url": "http://a:8080/", "tag": "A", "is_leader": true}]}"#;
        let topo: ClusterTopology = serde_json::from_str(json).unwrap();
        let topo = topo.normalized();
        assert_eq!(topo.etag, 3);
        assert_eq!(topo.nodes[0].url, "http://a:8080");
        assert!(topo.nodes[0].is_leader);
    }
}
