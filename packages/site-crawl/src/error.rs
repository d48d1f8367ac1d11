//! Typed errors for the crawl library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. None of these escape the
//! public orchestration API: [`crate::CrawlService`] turns every failure into
//! a failure-shaped [`crate::CanonicalCrawlResult`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the upstream crawler.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Upstream answered with a non-success HTTP status
    #[error("upstream rejected request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    /// Could not reach upstream (DNS, connect, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Upstream answered but the body could not be decoded
    #[error("malformed upstream response: {0}")]
    Decode(String),

    /// Request failed local validation
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// No credential was available for the call
    #[error("no API credential configured")]
    MissingCredential,
}

impl CrawlError {
    /// Map this error onto the failure taxonomy carried by results.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::UpstreamRejected { .. } => FailureKind::UpstreamRejected,
            Self::Transport(_) | Self::Decode(_) => FailureKind::TransportFailure,
            Self::InvalidRequest { .. } => FailureKind::InvalidRequest,
            Self::MissingCredential => FailureKind::MissingCredential,
        }
    }
}

impl From<reqwest::Error> for CrawlError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(Box::new(e))
        }
    }
}

/// Why a result came back with `success = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Non-2xx response with an upstream error message
    UpstreamRejected,
    /// Network unreachable or malformed JSON
    TransportFailure,
    /// Upstream payload had an unexpected shape
    NormalizationFailure,
    /// Request never left the process
    InvalidRequest,
    /// No credential available
    MissingCredential,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamRejected => "upstream_rejected",
            Self::TransportFailure => "transport_failure",
            Self::NormalizationFailure => "normalization_failure",
            Self::InvalidRequest => "invalid_request",
            Self::MissingCredential => "missing_credential",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Content envelope could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored row could not be mapped back
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },
}

/// Errors from the credential store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// Credential was empty or whitespace
    #[error("credential must not be empty")]
    Empty,
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Result type alias for crawl operations.
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_mapping() {
        let rejected = CrawlError::UpstreamRejected {
            status: 402,
            message: "Payment required".into(),
        };
        assert_eq!(rejected.failure_kind(), FailureKind::UpstreamRejected);

        let decode = CrawlError::Decode("expected value".into());
        assert_eq!(decode.failure_kind(), FailureKind::TransportFailure);

        assert_eq!(
            CrawlError::MissingCredential.failure_kind(),
            FailureKind::MissingCredential
        );
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::UpstreamRejected).unwrap();
        assert_eq!(json, "\"upstream_rejected\"");
        assert_eq!(FailureKind::TransportFailure.to_string(), "transport_failure");
    }
}
