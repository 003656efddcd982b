//! Cluster topology: snapshot types, shared cache, node selection

pub mod cache;
pub mod selector;
pub mod topology;

pub use cache::TopologyCache;
pub use selector::choose_node;
pub use topology::{ClusterTopology, ServerNode};
