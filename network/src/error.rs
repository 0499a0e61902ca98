use std::time::Duration;

use attest_registry::RegistryError;
use attest_types::NetworkId;
use thiserror::Error;

/// Failure of a single transport link.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("link closed")]
    Closed,

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Failure to establish the live connection for a network.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    UnknownNetwork(#[from] RegistryError),

    #[error("no endpoint available for {network_id}: tried {tried_endpoints:?}, errors {last_errors:?}")]
    NoEndpointsAvailable {
        network_id: NetworkId,
        tried_endpoints: Vec<String>,
        last_errors: Vec<String>,
    },

    #[error("connecting to {network_id} exceeded {timeout:?} (tried {tried_endpoints:?})")]
    Timeout {
        network_id: NetworkId,
        tried_endpoints: Vec<String>,
        timeout: Duration,
    },
}

/// Failure reported by the signing delegate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("signing capability unavailable: {0}")]
    Unavailable(String),

    #[error("signing rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Link(#[from] LinkError),
}
