//! Boundary to the property-data HTTP API

use crate::core::cache::QueryParams;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait PropertyApi: Send + Sync {
    /// GETs `endpoint` (relative to the API root) with query parameters.
    async fn get(&self, endpoint: &str, query: &QueryParams) -> Result<Value>;

    /// POSTs a JSON body to `endpoint`.
    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value>;
}

/// Why a fetch produced no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Status,
    Malformed,
    Timeout,
}

/// Error raised by API clients for non-2xx responses.
#[derive(Debug)]
pub struct HttpStatusError {
    pub status: u16,
    pub endpoint: String,
}

impl std::fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP error: {} for endpoint: {}", self.status, self.endpoint)
    }
}

impl std::error::Error for HttpStatusError {}

impl FailureKind {
    pub fn classify(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if cause.is::<tokio::time::error::Elapsed>() {
                return FailureKind::Timeout;
            }
            if cause.is::<HttpStatusError>() {
                return FailureKind::Status;
            }
            if cause.is::<serde_json::Error>() {
                return FailureKind::Malformed;
            }
            if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
                if e.is_timeout() {
                    return FailureKind::Timeout;
                }
                if e.is_decode() {
                    return FailureKind::Malformed;
                }
                return FailureKind::Network;
            }
        }
        FailureKind::Network
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_classify_failures() {
        let parse = serde_json::from_str::<Value>("{").context("Failed to parse response");
        assert_eq!(
            FailureKind::classify(&parse.unwrap_err()),
            FailureKind::Malformed
        );

        let status = anyhow::Error::new(HttpStatusError {
            status: 500,
            endpoint: "metrics/".to_string(),
        });
        assert_eq!(FailureKind::classify(&status), FailureKind::Status);
        assert_eq!(status.to_string(), "HTTP error: 500 for endpoint: metrics/");

        let other = anyhow::anyhow!("connection refused");
        assert_eq!(FailureKind::classify(&other), FailureKind::Network);
    }
}
