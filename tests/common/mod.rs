//! Shared test support: a scriptable in-memory transport

#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use minidoc::executor::command::Command;
use minidoc::executor::transport::{RawResponse, Transport};
use minidoc::{ClientConfig, ClusterTopology, ServerNode, TransportError};

type Handler =
    Box<dyn Fn(&ServerNode, &Command) -> Result<RawResponse, TransportError> + Send + Sync>;

/// Transport whose behavior is a closure over (node, command).
pub struct MockTransport {
    handler: Handler,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&ServerNode, &Command) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// (node url, command path) per attempted send, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path_fragment: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(_, path)| path.contains(path_fragment))
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        node: &ServerNode,
        command: &Command,
        _deadline: Duration,
    ) -> Result<RawResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((node.url.clone(), command.path.clone()));
        (self.handler)(node, command)
    }
}

pub fn node(url: &str, is_leader: bool) -> ServerNode {
    ServerNode {
        url: url.into(),
        tag: String::new(),
        is_leader,
    }
}

pub fn topology(etag: i64, nodes: Vec<ServerNode>) -> ClusterTopology {
    ClusterTopology::new(etag, nodes)
}

pub fn topology_response(topology: &ClusterTopology) -> RawResponse {
    RawResponse::new(200, serde_json::to_vec(topology).unwrap())
}

pub fn hilo_response(low: i64, high: i64) -> RawResponse {
    RawResponse::new(
        200,
        serde_json::to_vec(&serde_json::json!({ "low": low, "high": high })).unwrap(),
    )
}

pub fn refused(node: &ServerNode) -> TransportError {
    TransportError::Connect {
        url: node.url.clone(),
        reason: "connection refused".into(),
    }
}

pub fn timed_out(node: &ServerNode) -> TransportError {
    TransportError::Timeout {
        url: node.url.clone(),
        timeout: Duration::from_millis(50),
    }
}

pub fn is_topology_fetch(command: &Command) -> bool {
    command.path.starts_with("topology?")
}

/// Config tuned for tests: no backoff sleeps, short budgets.
pub fn test_config(urls: Vec<String>, database: &str) -> ClientConfig {
    let mut config = ClientConfig::new(urls, database);
    config.first_backoff_ms = 0;
    config.request_timeout_ms = 1_000;
    config.overall_budget_ms = 5_000;
    config
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}
