//! Command descriptions and typed results
//!
//! A `Command` is an immutable description of one database operation:
//! method, node-relative path, optional JSON body, and whether it may
//! be retried blindly. Constructors below cover the operations the
//! runtime itself needs (topology fetch, hilo allocation) plus the
//! document and database-lifecycle operations built on top of them.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;

use crate::common::encode_query_value;

/// May this command be resent after an ambiguous failure?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBehavior {
    /// Safe to retry on any transient failure
    Idempotent,
    /// Retried only when the request provably never reached the server
    NonIdempotent,
}

/// Immutable description of one database operation.
#[derive(Debug, Clone)]
pub struct Command {
    pub method: Method,
    /// Path relative to the node url, no leading slash
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub retry: RetryBehavior,
    /// Write-affecting commands prefer the cluster leader
    pub writes: bool,
}

impl Command {
    pub fn is_idempotent(&self) -> bool {
        self.retry == RetryBehavior::Idempotent
    }
}

// === Topology ===

/// Fetch the current cluster topology for a database.
pub fn get_topology(database: &str) -> Command {
    Command {
        method: Method::GET,
        path: format!("topology?name={}", encode_query_value(database)),
        body: None,
        retry: RetryBehavior::Idempotent,
        writes: false,
    }
}

// === HiLo ===

/// Result of a hilo range allocation.
#[derive(Debug, Clone, Deserialize)]
pub struct NextHiLoResult {
    #[serde(default)]
    pub prefix: String,
    pub low: i64,
    pub high: i64,
    #[serde(default)]
    pub last_size: i64,
    #[serde(default)]
    pub server_tag: String,
    #[serde(default)]
    pub last_range_at: Option<DateTime<Utc>>,
}

/// Allocate the next hilo range for a tag. The server sizes the batch
/// from the history we report; the client treats sizing as opaque.
///
/// Safe to retry: a duplicate allocation only burns a range, it never
/// hands the same interval to two clients.
pub fn next_hilo(
    database: &str,
    tag: &str,
    last_batch_size: i64,
    last_range_at: Option<DateTime<Utc>>,
    identity_parts_separator: &str,
    last_max: i64,
) -> Command {
    let last_range_at = last_range_at
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "0001-01-01T00:00:00Z".to_string());
    Command {
        method: Method::GET,
        path: format!(
            "databases/{}/hilo/next?tag={}&lastBatchSize={}&lastRangeAt={}&identityPartsSeparator={}&lastMax={}",
            encode_query_value(database),
            encode_query_value(tag),
            last_batch_size,
            encode_query_value(&last_range_at),
            encode_query_value(identity_parts_separator),
            last_max,
        ),
        body: None,
        retry: RetryBehavior::Idempotent,
        writes: false,
    }
}

/// Return the unused tail `[last, end]` of a hilo range.
pub fn hilo_return(database: &str, tag: &str, last: i64, end: i64) -> Command {
    Command {
        method: Method::PUT,
        path: format!(
            "databases/{}/hilo/return?tag={}&end={}&last={}",
            encode_query_value(database),
            encode_query_value(tag),
            end,
            last,
        ),
        body: None,
        retry: RetryBehavior::Idempotent,
        writes: true,
    }
}

// === Documents ===

/// Result of a document put.
#[derive(Debug, Clone, Deserialize)]
pub struct PutResult {
    pub id: String,
    #[serde(default)]
    pub change_vector: String,
}

pub fn put_document(database: &str, id: &str, document: serde_json::Value) -> Command {
    Command {
        method: Method::PUT,
        path: format!(
            "databases/{}/docs?id={}",
            encode_query_value(database),
            encode_query_value(id)
        ),
        body: Some(document),
        retry: RetryBehavior::NonIdempotent,
        writes: true,
    }
}

pub fn get_document(database: &str, id: &str) -> Command {
    Command {
        method: Method::GET,
        path: format!(
            "databases/{}/docs?id={}",
            encode_query_value(database),
            encode_query_value(id)
        ),
        body: None,
        retry: RetryBehavior::Idempotent,
        writes: false,
    }
}

pub fn delete_document(database: &str, id: &str) -> Command {
    Command {
        method: Method::DELETE,
        path: format!(
            "databases/{}/docs?id={}",
            encode_query_value(database),
            encode_query_value(id)
        ),
        body: None,
        retry: RetryBehavior::Idempotent,
        writes: true,
    }
}

// === Database lifecycle & maintenance ===

pub fn create_database(name: &str, replication_factor: usize) -> Command {
    Command {
        method: Method::PUT,
        path: format!(
            "admin/databases?name={}&replicationFactor={}",
            encode_query_value(name),
            replication_factor
        ),
        body: Some(serde_json::json!({ "database_name": name })),
        retry: RetryBehavior::NonIdempotent,
        writes: true,
    }
}

pub fn delete_database(name: &str, hard_delete: bool) -> Command {
    Command {
        method: Method::DELETE,
        path: format!(
            "admin/databases?name={}&hardDelete={}",
            encode_query_value(name),
            hard_delete
        ),
        body: None,
        retry: RetryBehavior::Idempotent,
        writes: true,
    }
}

/// Database statistics snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseStatistics {
    #[serde(default)]
    pub count_of_documents: u64,
    #[serde(default)]
    pub count_of_indexes: u64,
    #[serde(default)]
    pub database_id: String,
}

pub fn get_statistics(database: &str) -> Command {
    Command {
        method: Method::GET,
        path: format!("databases/{}/stats", encode_query_value(database)),
        body: None,
        retry: RetryBehavior::Idempotent,
        writes: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_command_shape() {
        let cmd = get_topology("north wind");
        assert_eq!(cmd.method, Method::GET);
        assert_eq!(cmd.path, "topology?name=north%20wind");
        assert!(cmd.is_idempotent());
        assert!(!cmd.writes);
    }

    #[test]
    fn test_hilo_next_encodes_history() {
        let cmd = next_hilo("db1", "users", 32, None, "/", 96);
        assert!(cmd.path.starts_with("databases/db1/hilo/next?tag=users"));
        assert!(cmd.path.contains("lastBatchSize=32"));
        assert!(cmd.path.contains("lastMax=96"));
        assert!(cmd.is_idempotent());
    }

    #[test]
    fn test_put_document_is_non_idempotent_write() {
        let cmd = put_document("db1", "users/1", serde_json::json!({"name": "em"}));
        assert_eq!(cmd.method, Method::PUT);
        assert_eq!(cmd.retry, RetryBehavior::NonIdempotent);
        assert!(cmd.writes);
        assert!(cmd.body.is_some());
    }

    #[test]
    fn test_reads_are_idempotent_non_writes() {
        for cmd in [get_document("db1", "users/1"), get_statistics("db1")] {
            assert_eq!(cmd.method, Method::GET);
            assert!(cmd.is_idempotent());
            assert!(!cmd.writes);
        }
    }
}
