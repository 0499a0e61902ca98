//! attest client.
//!
//! Loads [`ClientConfig`], builds the network registry from the built-in
//! table plus configured overrides, and wires the one connection manager
//! and verification service a process owns into an [`AttestContext`].

pub mod config;
pub mod context;
pub mod error;

pub use config::ClientConfig;
pub use context::AttestContext;
pub use error::ClientError;
