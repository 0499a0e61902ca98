//! Static table of ledger networks and their candidate endpoints.
//!
//! Built once at startup (built-in table plus any configured overrides) and
//! read-only afterwards.

pub mod builtin;
pub mod error;
pub mod registry;

pub use builtin::{builtin_networks, DEFAULT_NETWORK};
pub use error::RegistryError;
pub use registry::NetworkRegistry;
