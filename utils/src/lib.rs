//! Shared utilities for attest.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};
