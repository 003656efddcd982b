//! Shared topology cache with single-flight refresh
//!
//! Readers take cheap `Arc` clones of the current snapshot. A refresh
//! fetches a fresh topology through a caller-supplied future and
//! installs it only if its etag is newer than what is already cached.
//! Concurrent refresh triggers collapse into one in-flight fetch: late
//! arrivals wait on the refresh mutex and return the snapshot the
//! winner installed instead of fetching again.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::cluster::topology::ClusterTopology;
use crate::common::Result;

pub struct TopologyCache {
    snapshot: RwLock<Option<Arc<ClusterTopology>>>,
    // bumped after every completed refresh, installed or not
    generation: AtomicU64,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl TopologyCache {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
            generation: AtomicU64::new(0),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Last known snapshot, `None` before the first successful fetch.
    pub fn get(&self) -> Option<Arc<ClusterTopology>> {
        self.snapshot.read().unwrap().clone()
    }

    /// Etag of the cached snapshot, -1 when nothing is cached yet.
    pub fn etag(&self) -> i64 {
        self.get().map(|t| t.etag).unwrap_or(-1)
    }

    /// Install a fetched topology if it is newer than the cached one.
    /// Returns whether the snapshot was replaced.
    pub fn install(&self, fetched: ClusterTopology) -> bool {
        let mut guard = self.snapshot.write().unwrap();
        let newer = match guard.as_ref() {
            Some(current) => fetched.etag > current.etag,
            None => true,
        };
        if newer {
            *guard = Some(Arc::new(fetched));
        }
        newer
    }

    /// Refresh the cache through `fetch`, collapsing concurrent callers
    /// into a single in-flight fetch.
    pub async fn refresh<F, Fut>(&self, fetch: F) -> Result<Arc<ClusterTopology>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ClusterTopology>>,
    {
        let seen = self.generation.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        // someone else completed a refresh while we waited for the lock
        if self.generation.load(Ordering::Acquire) != seen {
            if let Some(snapshot) = self.get() {
                return Ok(snapshot);
            }
        }

        let fetched = fetch().await?.normalized();
        let installed = self.install(fetched);
        self.generation.fetch_add(1, Ordering::Release);
        if installed {
            tracing::debug!(etag = self.etag(), "installed refreshed topology");
        }

        self.get().ok_or_else(|| {
            crate::Error::UnexpectedResponse("topology refresh yielded no snapshot".into())
        })
    }
}

impl Default for TopologyCache {
    fn default() -> Self {
        Self::new()
    }
}
