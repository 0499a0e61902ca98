use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("payload too large: {size} > {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("record serialization failed: {0}")]
    Serialization(String),
}
