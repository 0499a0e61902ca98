//! Session record cache.
//!
//! Keyed by subject hash, one record per hash; a later write replaces the
//! earlier one and moves it to the front. Lives for the process only.

use std::collections::HashMap;

use tokio::sync::RwLock;

use attest_types::{SubjectHash, VerificationRecord};

struct Entry {
    seq: u64,
    record: VerificationRecord,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<SubjectHash, Entry>,
    next_seq: u64,
}

#[derive(Default)]
pub struct SessionCache {
    inner: RwLock<Inner>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, hash: &SubjectHash) -> Option<VerificationRecord> {
        self.inner
            .read()
            .await
            .entries
            .get(hash)
            .map(|e| e.record.clone())
    }

    /// Insert or replace the record for its subject hash, returning the
    /// previous record if there was one.
    pub async fn put(&self, record: VerificationRecord) -> Option<VerificationRecord> {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner
            .entries
            .insert(record.subject_hash, Entry { seq, record })
            .map(|e| e.record)
    }

    /// All records, most recently written first.
    pub async fn list(&self) -> Vec<VerificationRecord> {
        let inner = self.inner.read().await;
        let mut entries: Vec<&Entry> = inner.entries.values().collect();
        entries.sort_by(|a, b| b.seq.cmp(&a.seq));
        entries.into_iter().map(|e| e.record.clone()).collect()
    }

    pub async fn contains(&self, hash: &SubjectHash) -> bool {
        self.inner.read().await.entries.contains_key(hash)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
