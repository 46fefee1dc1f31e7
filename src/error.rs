use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::TransportErrorKind;

/// Fatal errors raised before any network I/O.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported scheme '{scheme}' in '{url}': expected http or https")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("unknown HTTP method '{0}'. Supported: GET, POST, PUT, DELETE, PATCH, OPTIONS, TRACE, HEAD, CONNECT")]
    UnknownMethod(String),

    #[error("method set is empty")]
    EmptyMethodSet,

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("{name} must be at least 1")]
    InvalidBound { name: &'static str },

    #[error("failed to read rules file {path}: {source}")]
    RulesRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules file {path}: {source}")]
    RulesParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A single request that never produced an HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportFailure {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportFailure {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A page the discoverer could not fetch. Recorded, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("failed to fetch {url}: {reason}")]
pub struct DiscoveryFetchError {
    pub url: String,
    pub reason: String,
}
