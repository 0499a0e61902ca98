//! Nullable infrastructure for deterministic testing.
//!
//! Everything outside the process (clock, ledger transport, signing
//! provider) sits behind a trait. This crate provides implementations that:
//! - Return scripted values
//! - Can be driven programmatically (emit statuses, refuse endpoints)
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod link;
pub mod signer;
pub mod transport;

pub use clock::NullClock;
pub use link::NullLink;
pub use signer::NullSigner;
pub use transport::{EndpointBehavior, NullTransport};
