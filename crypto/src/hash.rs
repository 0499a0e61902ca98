//! SHA-256 content digests and Blake2b operation hashes.

use std::io::{self, Read};

use attest_types::SubjectHash;
use blake2::digest::consts::U32;
use blake2::Blake2b;
use sha2::{Digest, Sha256};

type Blake2b256 = Blake2b<U32>;

/// Read buffer for [`digest_reader`].
const READ_CHUNK: usize = 64 * 1024;

/// Compute a SHA-256 digest of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// The subject hash of a piece of content: SHA-256 over its exact bytes.
pub fn content_digest(content: &[u8]) -> SubjectHash {
    SubjectHash::new(sha256(content))
}

/// Incremental subject hashing for content that arrives in pieces.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha256,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    pub fn finalize(self) -> SubjectHash {
        SubjectHash::new(self.inner.finalize().into())
    }
}

/// Hash everything a reader yields, without buffering it all in memory.
pub fn digest_reader(mut reader: impl Read) -> io::Result<SubjectHash> {
    let mut hasher = ContentHasher::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// The reference under which the ledger knows an encoded operation:
/// `0x`-prefixed hex of its Blake2b-256 hash.
pub fn operation_reference(encoded_operation: &[u8]) -> String {
    format!("0x{}", hex::encode(blake2b_256(encoded_operation)))
}
