//! Topology-aware request executor
//!
//! Orchestrates command execution against the cluster: picks a node
//! from the cached topology, classifies each attempt's outcome, fails
//! over on transient errors, forces a topology refresh on stale
//! indicators, and surfaces fatal errors untouched.
//!
//! No lock is held across a network call; only the topology snapshot
//! swap and the single-flight refresh serialize concurrent callers.

pub mod command;
pub mod transport;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::cluster::{choose_node, ClusterTopology, ServerNode, TopologyCache};
use crate::common::{ClientConfig, Error, ErrorCategory, Result};
use command::Command;
use transport::{classify, HttpTransport, Outcome, RawResponse, Transport};

pub struct RequestExecutor {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    cache: TopologyCache,
    seed_nodes: Vec<ServerNode>,
    refreshes: AtomicU64,
}

impl RequestExecutor {
    /// Executor over HTTP.
    pub fn new(config: ClientConfig) -> Result<Arc<Self>> {
        Self::with_transport(config, Arc::new(HttpTransport::new()))
    }

    /// Executor over a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Arc<Self>> {
        let config = config.validated()?;
        let seed_nodes = config.urls.iter().map(|url| ServerNode::new(url.clone())).collect();
        Ok(Arc::new(Self {
            config,
            transport,
            cache: TopologyCache::new(),
            seed_nodes,
            refreshes: AtomicU64::new(0),
        }))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn database(&self) -> &str {
        &self.config.database
    }

    /// Last known topology snapshot, if any.
    pub fn topology(&self) -> Option<Arc<ClusterTopology>> {
        self.cache.get()
    }

    /// Number of topology fetches actually performed (collapsed
    /// single-flight refreshes count once).
    pub fn topology_refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Install a topology without a network round trip. Ignored unless
    /// newer than the cached snapshot.
    pub fn install_topology(&self, topology: ClusterTopology) -> bool {
        self.cache.install(topology.normalized())
    }

    /// Execute a command, retrying and failing over per its retry
    /// behavior. Returns the raw response of the first success.
    pub async fn execute(&self, command: &Command) -> Result<RawResponse> {
        let started = Instant::now();
        let mut topology = self.ensure_topology().await?;

        let mut excluded: HashSet<String> = HashSet::new();
        let mut attempts = 0usize;
        let mut total_attempts = 0usize;
        let mut stale_refreshes = 0usize;
        let mut failed_over = false;
        let mut last_error: Option<Error> = None;

        loop {
            if started.elapsed() >= self.config.overall_budget() {
                return Err(self.unreachable(total_attempts, last_error));
            }

            let node = match choose_node(&topology, &excluded, command.writes) {
                Ok(node) => node,
                Err(err @ Error::NoNodeAvailable(_)) => {
                    if failed_over {
                        return Err(self.unreachable(total_attempts, last_error.or(Some(err))));
                    }
                    failed_over = true;
                    topology = self.refresh_topology().await?;
                    excluded.clear();
                    attempts = 0;
                    continue;
                }
                Err(err) => return Err(err),
            };

            tracing::debug!(
                node = %node.url,
                method = %command.method,
                path = %command.path,
                attempt = total_attempts + 1,
                "executing command"
            );

            let outcome = match self
                .transport
                .send(&node, command, self.config.request_timeout())
                .await
            {
                Ok(response) => classify(&node.url, response),
                Err(transport_error) => Outcome::Transient(transport_error),
            };

            match outcome {
                Outcome::Success(response) => return Ok(response),

                Outcome::Fatal { category, message } => {
                    return Err(Error::Application { category, message });
                }

                Outcome::StaleTopology => {
                    if stale_refreshes >= self.config.max_stale_refreshes {
                        return Err(Error::StaleTopology { url: node.url });
                    }
                    stale_refreshes += 1;
                    tracing::warn!(node = %node.url, "stale topology reported, refreshing");
                    // stale handling does not consume the attempt budget
                    topology = self.refresh_topology().await?;
                    continue;
                }

                Outcome::Transient(transport_error) => {
                    if !command.is_idempotent() && transport_error.possibly_applied() {
                        // the command may have been applied; surfacing
                        // beats a possible double write
                        return Err(Error::Transport(transport_error));
                    }

                    tracing::warn!(
                        node = %node.url,
                        error = %transport_error,
                        "node failed, excluding from this call"
                    );
                    excluded.insert(node.url);
                    attempts += 1;
                    total_attempts += 1;
                    last_error = Some(Error::Transport(transport_error));

                    if attempts >= self.config.max_attempts {
                        if failed_over {
                            return Err(self.unreachable(total_attempts, last_error));
                        }
                        // one refresh, one extra bounded cycle, then give up
                        failed_over = true;
                        topology = self.refresh_topology().await?;
                        excluded.clear();
                        attempts = 0;
                        continue;
                    }

                    self.backoff(attempts).await;
                }
            }
        }
    }

    /// Execute and decode the response body as JSON.
    pub async fn execute_json<T: serde::de::DeserializeOwned>(&self, command: &Command) -> Result<T> {
        self.execute(command).await?.json()
    }

    fn unreachable(&self, attempts: usize, last_error: Option<Error>) -> Error {
        Error::AllNodesUnreachable {
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt completed".to_string()),
        }
    }

    async fn ensure_topology(&self) -> Result<Arc<ClusterTopology>> {
        match self.cache.get() {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh_topology().await,
        }
    }

    /// Single-flight topology refresh via any reachable node.
    async fn refresh_topology(&self) -> Result<Arc<ClusterTopology>> {
        let candidates = match self.cache.get() {
            Some(snapshot) => snapshot.nodes.clone(),
            None => self.seed_nodes.clone(),
        };
        self.cache
            .refresh(|| self.fetch_topology(candidates))
            .await
    }

    async fn fetch_topology(&self, candidates: Vec<ServerNode>) -> Result<ClusterTopology> {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        let command = command::get_topology(&self.config.database);

        let mut last_error = String::new();
        for node in &candidates {
            match self
                .transport
                .send(node, &command, self.config.request_timeout())
                .await
            {
                Ok(response) => match classify(&node.url, response) {
                    Outcome::Success(response) => {
                        let topology: ClusterTopology = response.json()?;
                        if topology.is_empty() {
                            return Err(Error::UnexpectedResponse(format!(
                                "{} returned an empty topology",
                                node.url
                            )));
                        }
                        tracing::debug!(
                            node = %node.url,
                            etag = topology.etag,
                            nodes = topology.nodes.len(),
                            "fetched topology"
                        );
                        return Ok(topology);
                    }
                    Outcome::Fatal { category, message } => {
                        if category == ErrorCategory::DatabaseDoesNotExist {
                            return Err(Error::Application { category, message });
                        }
                        last_error = message;
                    }
                    _ => last_error = format!("{} could not serve topology", node.url),
                },
                Err(transport_error) => last_error = transport_error.to_string(),
            }
        }

        Err(Error::AllNodesUnreachable {
            attempts: candidates.len(),
            last_error,
        })
    }

    async fn backoff(&self, attempt: usize) {
        let base = self.config.first_backoff().as_millis() as u64;
        if base == 0 {
            return;
        }
        let exp = base.saturating_mul(1 << (attempt.min(6) - 1) as u32);
        let capped = exp.min(2_000);
        let jitter = rand::thread_rng().gen_range(0..=capped / 2);
        tokio::time::sleep(Duration::from_millis(capped + jitter)).await;
    }
}
