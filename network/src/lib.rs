//! Ledger connectivity for attest.
//!
//! Owns the one live connection to a ledger network: resolves a network to
//! its candidate endpoints, tries them strictly in order under per-endpoint
//! and overall timeouts, and tears the old connection down before a new one
//! is made. The concrete wire is pluggable behind [`Transport`]; a WebSocket
//! JSON-RPC implementation is provided.

pub mod connection;
pub mod error;
pub mod scale;
pub mod signer;
pub mod transport;
pub mod ws;

pub use connection::{ConnectOptions, Connection, ConnectionManager};
pub use error::{ConnectionError, LinkError, SignerError};
pub use signer::SigningDelegate;
pub use transport::{ActivityItem, ChainHead, LedgerLink, OperationStatus, OperationWatch, Transport};
pub use ws::WsTransport;
