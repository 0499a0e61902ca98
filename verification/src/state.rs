//! Submission progress tracking.

use serde::Serialize;
use tokio::sync::watch;

/// Where a submission is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionState {
    Idle,
    /// Acquiring the live connection.
    Connecting,
    /// Handing the encoded record to the signing delegate.
    Submitting,
    /// Broadcast; waiting for the ledger to include it.
    AwaitingInclusion,
    Finalized,
    Failed,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Failed)
    }

    /// Forward-only: each phase leads to the next, any live phase may fail,
    /// and terminal phases lead nowhere.
    pub fn can_advance_to(&self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Submitting)
                | (Submitting, AwaitingInclusion)
                | (AwaitingInclusion, Finalized)
                | (Idle | Connecting | Submitting | AwaitingInclusion, Failed)
        )
    }
}

/// Publishes a submission's state to any number of observers.
///
/// A tracker dropped before reaching a terminal state moves to `Failed`, so
/// every submission that gets as far as `Connecting` ends somewhere.
pub(crate) struct StateTracker {
    tx: watch::Sender<SubmissionState>,
}

impl StateTracker {
    pub(crate) fn new() -> (Self, watch::Receiver<SubmissionState>) {
        let (tx, rx) = watch::channel(SubmissionState::Idle);
        (Self { tx }, rx)
    }

    /// Move to `next` if the transition is legal. Returns whether it moved.
    pub(crate) fn advance(&self, next: SubmissionState) -> bool {
        self.tx.send_if_modified(|state| {
            if state.can_advance_to(next) {
                *state = next;
                true
            } else {
                false
            }
        })
    }
}

impl Drop for StateTracker {
    fn drop(&mut self) {
        self.advance(SubmissionState::Failed);
    }
}
