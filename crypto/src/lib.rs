//! Digest primitives for attest.
//!
//! - **SHA-256** for subject hashes (the content digest a record is keyed by)
//! - **Blake2b-256** for ledger operation references

pub mod hash;

pub use hash::{
    blake2b_256, content_digest, digest_reader, operation_reference, sha256, ContentHasher,
};
