use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("network {0} registered twice")]
    DuplicateNetwork(String),

    #[error("network {0} has no endpoints")]
    NoEndpoints(String),

    #[error("invalid network entry: {0}")]
    InvalidEntry(String),
}
