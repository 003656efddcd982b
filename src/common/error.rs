//! Error types for minidoc

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Transient failure of a single execution attempt.
///
/// `Connect` and `Unavailable` are known to leave the command
/// unapplied; `Timeout` and `Other` are ambiguous and must not be
/// blindly retried for non-idempotent commands.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The node answered, but with a transient rejection (e.g. 503)
    #[error("{url} rejected the request with status {status}")]
    Unavailable { url: String, status: u16 },

    #[error("transport failure talking to {url}: {reason}")]
    Other { url: String, reason: String },
}

impl TransportError {
    /// Might the command have been applied despite the failure?
    pub fn possibly_applied(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout { .. } | TransportError::Other { .. }
        )
    }

    /// Node the failed call was addressed to.
    pub fn url(&self) -> &str {
        match self {
            TransportError::Connect { url, .. }
            | TransportError::Timeout { url, .. }
            | TransportError::Unavailable { url, .. }
            | TransportError::Other { url, .. } => url,
        }
    }
}

/// Server-supplied category of a fatal application error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    DatabaseDoesNotExist,
    NotFound,
    Conflict,
    BadRequest,
    ServerError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::DatabaseDoesNotExist => write!(f, "database does not exist"),
            ErrorCategory::NotFound => write!(f, "not found"),
            ErrorCategory::Conflict => write!(f, "conflict"),
            ErrorCategory::BadRequest => write!(f, "bad request"),
            ErrorCategory::ServerError => write!(f, "server error"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    // === Transport / routing ===
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("node {url} reported a stale topology")]
    StaleTopology { url: String },

    #[error("no node available: {0}")]
    NoNodeAvailable(String),

    #[error("all cluster nodes unreachable after {attempts} attempts: {last_error}")]
    AllNodesUnreachable { attempts: usize, last_error: String },

    // === Application (fatal, server-reported) ===
    #[error("{category}: {message}")]
    Application {
        category: ErrorCategory,
        message: String,
    },

    // === HiLo ===
    #[error(
        "hilo range for tag '{tag}' regressed: server returned low {low} <= last issued {floor}"
    )]
    KeyRangeInconsistency { tag: String, low: i64, floor: i64 },

    // === Config / decoding ===
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    // === Generic ===
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Is this error recoverable by failing over to another node?
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::StaleTopology { .. } | Error::NoNodeAvailable(_)
        )
    }

    /// Category of a fatal application error, if any.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Error::Application { category, .. } => Some(*category),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::UnexpectedResponse(format!("JSON decode error: {}", e))
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let e = Error::Transport(TransportError::Connect {
            url: "http://a:8080".into(),
            reason: "refused".into(),
        });
        assert!(e.is_retryable());

        let e = Error::Application {
            category: ErrorCategory::Conflict,
            message: "document changed".into(),
        };
        assert!(!e.is_retryable());
        assert_eq!(e.category(), Some(ErrorCategory::Conflict));

        let e = Error::AllNodesUnreachable {
            attempts: 3,
            last_error: "refused".into(),
        };
        assert!(!e.is_retryable());
    }

    #[test]
    fn test_transport_ambiguity() {
        let connect = TransportError::Connect {
            url: "http://a:8080".into(),
            reason: "refused".into(),
        };
        assert!(!connect.possibly_applied());

        let rejected = TransportError::Unavailable {
            url: "http://a:8080".into(),
            status: 503,
        };
        assert!(!rejected.possibly_applied());

        let timeout = TransportError::Timeout {
            url: "http://a:8080".into(),
            timeout: Duration::from_secs(5),
        };
        assert!(timeout.possibly_applied());
    }
}
