//! Nullable ledger link: scripted chain state, recorded submissions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use attest_crypto::operation_reference;
use attest_network::{ActivityItem, ChainHead, LedgerLink, LinkError, OperationStatus, OperationWatch};

const STATUS_BUFFER: usize = 16;

/// A test link that serves scripted chain state.
///
/// Submissions are recorded and left pending; drive them forward with
/// [`NullLink::emit`] or [`NullLink::include`].
pub struct NullLink {
    endpoint: String,
    connected: AtomicBool,
    activity: Mutex<Vec<ActivityItem>>,
    block_numbers: Mutex<HashMap<String, u64>>,
    head: Mutex<ChainHead>,
    next_reference: Mutex<Option<String>>,
    submit_error: Mutex<Option<LinkError>>,
    query_error: Mutex<Option<LinkError>>,
    submitted: Mutex<Vec<Vec<u8>>>,
    watchers: Mutex<Vec<mpsc::Sender<OperationStatus>>>,
    scans: AtomicUsize,
    closes: AtomicUsize,
}

impl NullLink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connected: AtomicBool::new(true),
            activity: Mutex::new(Vec::new()),
            block_numbers: Mutex::new(HashMap::new()),
            head: Mutex::new(ChainHead::default()),
            next_reference: Mutex::new(None),
            submit_error: Mutex::new(None),
            query_error: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            watchers: Mutex::new(Vec::new()),
            scans: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    /// Place a payload on the scripted chain. The head follows the highest
    /// block seen.
    pub fn push_activity(
        &self,
        block_number: u64,
        block_hash: &str,
        transaction_reference: &str,
        payload: impl Into<Vec<u8>>,
    ) {
        self.activity.lock().unwrap().push(ActivityItem {
            block_number,
            block_hash: block_hash.to_string(),
            transaction_reference: transaction_reference.to_string(),
            payload: payload.into(),
        });
        self.set_block_number(block_hash, block_number);
        let mut head = self.head.lock().unwrap();
        if block_number >= head.number {
            *head = ChainHead {
                number: block_number,
                hash: block_hash.to_string(),
            };
        }
    }

    pub fn set_block_number(&self, block_hash: &str, number: u64) {
        self.block_numbers
            .lock()
            .unwrap()
            .insert(block_hash.to_string(), number);
    }

    pub fn set_head(&self, number: u64, hash: &str) {
        *self.head.lock().unwrap() = ChainHead {
            number,
            hash: hash.to_string(),
        };
    }

    /// Reference reported for the next submission, instead of the digest.
    pub fn set_transaction_reference(&self, reference: &str) {
        *self.next_reference.lock().unwrap() = Some(reference.to_string());
    }

    /// Make every following submission fail with `error`.
    pub fn fail_submissions(&self, error: LinkError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    /// Make every following query fail with `error`.
    pub fn fail_queries(&self, error: LinkError) {
        *self.query_error.lock().unwrap() = Some(error);
    }

    /// Push a status to the most recent submission's watcher.
    pub fn emit(&self, status: OperationStatus) -> bool {
        match self.watchers.lock().unwrap().last() {
            Some(watcher) => watcher.try_send(status).is_ok(),
            None => false,
        }
    }

    /// Report the most recent submission as included in block `number`.
    pub fn include(&self, block_hash: &str, number: u64) -> bool {
        self.set_block_number(block_hash, number);
        self.emit(OperationStatus::InBlock {
            block_hash: block_hash.to_string(),
        })
    }

    /// Close every status stream without a terminal status.
    pub fn drop_watchers(&self) {
        self.watchers.lock().unwrap().clear();
    }

    /// Simulate the node going away.
    pub fn sever(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.drop_watchers();
    }

    /// Operations submitted so far.
    pub fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().unwrap().clone()
    }

    /// Number of `recent_activity` calls served.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn check_queries(&self) -> Result<(), LinkError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(LinkError::Closed);
        }
        match self.query_error.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerLink for NullLink {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn submit(&self, operation: Vec<u8>) -> Result<OperationWatch, LinkError> {
        if !self.is_connected() {
            return Err(LinkError::Closed);
        }
        if let Some(error) = self.submit_error.lock().unwrap().clone() {
            return Err(error);
        }
        let transaction_reference = self
            .next_reference
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| operation_reference(&operation));
        self.submitted.lock().unwrap().push(operation);

        let (tx, updates) = mpsc::channel(STATUS_BUFFER);
        self.watchers.lock().unwrap().push(tx);
        Ok(OperationWatch {
            transaction_reference,
            updates,
        })
    }

    async fn block_number(&self, block_hash: &str) -> Result<u64, LinkError> {
        self.check_queries()?;
        self.block_numbers
            .lock()
            .unwrap()
            .get(block_hash)
            .copied()
            .ok_or_else(|| LinkError::InvalidResponse(format!("unknown block {block_hash}")))
    }

    async fn chain_head(&self) -> Result<ChainHead, LinkError> {
        self.check_queries()?;
        Ok(self.head.lock().unwrap().clone())
    }

    async fn recent_activity(&self, depth: u32) -> Result<Vec<ActivityItem>, LinkError> {
        self.check_queries()?;
        self.scans.fetch_add(1, Ordering::SeqCst);
        let head = self.head.lock().unwrap().number;
        let mut items: Vec<ActivityItem> = self
            .activity
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.block_number + u64::from(depth) > head)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.block_number);
        Ok(items)
    }

    async fn close(&self) -> Result<(), LinkError> {
        self.connected.store(false, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.drop_watchers();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_activity_is_windowed_by_depth() {
        let link = NullLink::new("ws://null");
        link.push_activity(10, "0x0a", "tx-a", b"old".to_vec());
        link.push_activity(100, "0x64", "tx-b", b"new".to_vec());

        let recent = link.recent_activity(5).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].payload, b"new");

        let all = link.recent_activity(200).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(link.scan_count(), 2);
    }

    #[tokio::test]
    async fn submissions_are_recorded_and_driven() {
        let link = NullLink::new("ws://null");
        link.set_transaction_reference("tx-xyz");
        let mut watch = link.submit(b"payload".to_vec()).await.unwrap();
        assert_eq!(watch.transaction_reference, "tx-xyz");
        assert_eq!(link.submitted(), vec![b"payload".to_vec()]);

        assert!(link.include("0xblock", 100));
        assert_eq!(
            watch.updates.recv().await,
            Some(OperationStatus::InBlock {
                block_hash: "0xblock".into()
            })
        );
        assert_eq!(link.block_number("0xblock").await, Ok(100));
    }

    #[tokio::test]
    async fn closed_link_refuses_work() {
        let link = NullLink::new("ws://null");
        link.close().await.unwrap();
        assert!(!link.is_connected());
        assert_eq!(link.submit(vec![1]).await.unwrap_err(), LinkError::Closed);
        assert_eq!(link.chain_head().await, Err(LinkError::Closed));
        assert_eq!(link.close_count(), 1);
    }
}
