//! Transport abstraction: how a link to one endpoint is opened and what it
//! can do once open.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::LinkError;

/// Opens links to endpoint addresses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a link and wait until it is ready to serve requests.
    async fn open(&self, endpoint: &str) -> Result<Arc<dyn LedgerLink>, LinkError>;
}

/// A duplex, subscribe-and-submit channel to one ledger node.
#[async_trait]
pub trait LedgerLink: Send + Sync {
    fn endpoint(&self) -> &str;

    /// Whether the underlying channel is still up.
    fn is_connected(&self) -> bool;

    /// Broadcast an encoded, signed operation and watch its progress.
    async fn submit(&self, operation: Vec<u8>) -> Result<OperationWatch, LinkError>;

    /// Ordinal number of the block with the given hash.
    async fn block_number(&self, block_hash: &str) -> Result<u64, LinkError>;

    async fn chain_head(&self) -> Result<ChainHead, LinkError>;

    /// Opaque payloads carried by operations in the most recent `depth`
    /// blocks, oldest first.
    async fn recent_activity(&self, depth: u32) -> Result<Vec<ActivityItem>, LinkError>;

    async fn close(&self) -> Result<(), LinkError>;
}

/// Progress of a submitted operation, as pushed by the node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationStatus {
    /// Queued, waiting on an earlier operation from the same account.
    Future,
    Ready,
    Broadcast,
    InBlock { block_hash: String },
    /// The containing block left the best chain; inclusion may follow again.
    Retracted { block_hash: String },
    FinalityTimeout { block_hash: String },
    Finalized { block_hash: String },
    Usurped { by: String },
    Dropped { reason: String },
    Invalid { reason: String },
    /// Included, but the call itself failed.
    DispatchFailed { module: Option<String>, reason: String },
}

impl OperationStatus {
    /// The block that included the operation, for inclusion statuses.
    pub fn included_in(&self) -> Option<&str> {
        match self {
            Self::InBlock { block_hash } | Self::Finalized { block_hash } => Some(block_hash),
            _ => None,
        }
    }

    /// No further updates follow this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Finalized { .. }
                | Self::FinalityTimeout { .. }
                | Self::Usurped { .. }
                | Self::Dropped { .. }
                | Self::Invalid { .. }
                | Self::DispatchFailed { .. }
        )
    }
}

/// Handle on a broadcast operation.
#[derive(Debug)]
pub struct OperationWatch {
    /// How the ledger refers to the operation.
    pub transaction_reference: String,
    /// Status updates; closes when the node stops reporting.
    pub updates: mpsc::Receiver<OperationStatus>,
}

/// One opaque payload observed on the ledger.
///
/// When argument boundaries inside an operation are ambiguous, the same
/// operation can yield several items; consumers decide which one is theirs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityItem {
    pub block_number: u64,
    pub block_hash: String,
    pub transaction_reference: String,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainHead {
    pub number: u64,
    pub hash: String,
}
