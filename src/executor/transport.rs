//! Command transport and outcome classification
//!
//! The transport sends one command to one node with a deadline and
//! reports either a raw response or a `TransportError`. The executor
//! never inspects wire details; it works purely on the classified
//! `Outcome` of each attempt.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;

use crate::cluster::ServerNode;
use crate::common::{ErrorCategory, TransportError};
use crate::executor::command::Command;

/// HTTP-like response before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Classified result of one execution attempt.
#[derive(Debug)]
pub enum Outcome {
    Success(RawResponse),
    Transient(TransportError),
    /// Leader redirect or explicit not-primary indicator
    StaleTopology,
    Fatal {
        category: ErrorCategory,
        message: String,
    },
}

/// Fixed status table mapping a response from `url` to an outcome.
pub fn classify(url: &str, response: RawResponse) -> Outcome {
    match response.status {
        200..=299 => Outcome::Success(response),
        301 | 302 | 307 | 308 => Outcome::StaleTopology,
        408 | 502 | 503 | 504 => Outcome::Transient(TransportError::Unavailable {
            url: url.to_string(),
            status: response.status,
        }),
        status => {
            let category = match status {
                400 => ErrorCategory::BadRequest,
                404 => ErrorCategory::NotFound,
                409 => ErrorCategory::Conflict,
                410 => ErrorCategory::DatabaseDoesNotExist,
                _ => ErrorCategory::ServerError,
            };
            let message = match std::str::from_utf8(&response.body) {
                Ok(text) if !text.is_empty() => text.to_string(),
                _ => format!("status {}", status),
            };
            Outcome::Fatal { category, message }
        }
    }
}

/// Sends one command to one node within a deadline.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        node: &ServerNode,
        command: &Command,
        deadline: Duration,
    ) -> std::result::Result<RawResponse, TransportError>;
}

static SHARED_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: SHARED_CLIENT.clone(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        node: &ServerNode,
        command: &Command,
        deadline: Duration,
    ) -> std::result::Result<RawResponse, TransportError> {
        let url = format!("{}/{}", node.url, command.path);

        let mut request = self
            .client
            .request(command.method.clone(), &url)
            .timeout(deadline);
        if let Some(body) = &command.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                TransportError::Connect {
                    url: node.url.clone(),
                    reason: e.to_string(),
                }
            } else if e.is_timeout() {
                TransportError::Timeout {
                    url: node.url.clone(),
                    timeout: deadline,
                }
            } else {
                TransportError::Other {
                    url: node.url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| TransportError::Other {
            url: node.url.clone(),
            reason: format!("reading response body: {}", e),
        })?;

        Ok(RawResponse { status, body })
    }
}
