//! Fundamental types for attest.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! subject hashes, network identifiers and descriptors, verification records,
//! signing accounts, and timestamps.

pub mod account;
pub mod error;
pub mod hash;
pub mod network;
pub mod record;
pub mod time;

pub use account::Account;
pub use error::TypesError;
pub use hash::SubjectHash;
pub use network::{NetworkDescriptor, NetworkId};
pub use record::{RecordKind, RecordStatus, VerificationRecord};
pub use time::{Clock, SystemClock, Timestamp};
