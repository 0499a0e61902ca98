use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("config error: {0}")]
    Config(String),

    #[error("registry error: {0}")]
    Registry(#[from] attest_registry::RegistryError),

    #[error(transparent)]
    Service(#[from] attest_verification::ServiceError),

    #[error("logging error: {0}")]
    Logging(#[from] attest_utils::LoggingError),
}
