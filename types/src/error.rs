//! Error type for the fundamental types.

use thiserror::Error;

use crate::record::RecordStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid subject hash: {0}")]
    InvalidHash(String),

    #[error("invalid network id: {0:?}")]
    InvalidNetworkId(String),

    #[error("illegal record transition: {from} -> {to}")]
    IllegalTransition { from: RecordStatus, to: RecordStatus },
}
