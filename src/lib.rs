//! # minidoc
//!
//! A cluster-aware client runtime for a distributed document database:
//! - Topology-aware request routing with failover and retry
//! - Versioned topology cache with single-flight refresh
//! - HiLo unique-key generation with batch range allocation
//! - Typed document and database-lifecycle operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────────┐
//! │ DocumentStore │──▶│  RequestExecutor   │──┐
//! └──────────────┘   │  - node selection  │  │ HTTP
//! ┌──────────────┐   │  - retry/failover  │  ▼
//! │ HiLo          │─▶│  - topology cache  │  cluster nodes
//! │ generators    │   └────────────────────┘
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use minidoc::{ClientConfig, DocumentStore};
//!
//! # async fn run() -> minidoc::Result<()> {
//! let config = ClientConfig::new(vec!["http://localhost:8080".into()], "orders");
//! let store = DocumentStore::new(config)?;
//!
//! let id = store.store_new("orders", serde_json::json!({ "total": 12 })).await?;
//! let doc = store.get_document(&id).await?;
//! store.close().await;
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod common;
pub mod executor;
pub mod hilo;
pub mod store;

// Re-export commonly used types
pub use cluster::{ClusterTopology, ServerNode, TopologyCache};
pub use common::{ClientConfig, Error, ErrorCategory, Result, TransportError};
pub use executor::RequestExecutor;
pub use hilo::{HiLoIdGenerator, MultiTagHiLoGenerator};
pub use store::DocumentStore;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
