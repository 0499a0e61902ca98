use attest_network::ConnectionError;
use attest_protocol::ProtocolError;
use attest_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no signing provider available")]
    NoProvider,

    #[error("signing provider exposes no accounts")]
    NoAccounts,

    #[error("account {0} is not offered by the signing provider")]
    UnknownAccount(String),

    #[error("signing provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("insufficient balance: {reason}")]
    InsufficientBalance { reason: String },

    #[error("rejected by the ledger: {reason}")]
    ModuleRejected { reason: String },

    #[error("transport dropped: {reason}")]
    TransportDropped { reason: String },

    #[error("encoding error: {0}")]
    Encoding(#[from] ProtocolError),

    #[error("record cannot take the outcome: {0}")]
    InvalidRecord(#[from] TypesError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("ledger query failed: {0}")]
    TransportFailure(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not ready: {0}")]
    NotReady(String),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Query(#[from] QueryError),
}
