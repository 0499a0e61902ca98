//! The verification service: accounts, network selection, submission and
//! verification over the single live connection.

use std::sync::Arc;

use tokio::sync::{oneshot, watch, Mutex, RwLock};

use attest_crypto::content_digest;
use attest_network::{
    ConnectOptions, Connection, ConnectionManager, LedgerLink, OperationStatus, OperationWatch,
    SigningDelegate,
};
use attest_types::{Account, Clock, NetworkId, SubjectHash, VerificationRecord};

use crate::classify::{classify_signer_error, classify_status};
use crate::state::StateTracker;
use crate::{
    AuthError, QueryError, ServiceError, SessionCache, ServiceStats, StatsSnapshot, SubmissionError,
    SubmissionRequest, SubmissionState,
};

/// Blocks scanned by `verify` when the cache misses. Records older than
/// this are reported as not found.
pub const DEFAULT_SCAN_DEPTH: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceOptions {
    pub connect: ConnectOptions,
    pub scan_depth: u32,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            connect: ConnectOptions::default(),
            scan_depth: DEFAULT_SCAN_DEPTH,
        }
    }
}

#[derive(Default)]
struct AccountState {
    accounts: Vec<Account>,
    selected: Option<Account>,
}

/// Handle on an in-flight submission.
///
/// The outcome is delivered exactly once; the state can be observed at any
/// time and ends in `Finalized` or `Failed`.
pub struct Submission {
    record: watch::Receiver<VerificationRecord>,
    state: watch::Receiver<SubmissionState>,
    outcome: oneshot::Receiver<Result<VerificationRecord, SubmissionError>>,
}

impl Submission {
    /// The record as it stands: `Pending` until the outcome, then
    /// `Verified` or `Failed`.
    pub fn record(&self) -> VerificationRecord {
        self.record.borrow().clone()
    }

    pub fn state(&self) -> SubmissionState {
        *self.state.borrow()
    }

    /// A receiver for following state changes.
    pub fn watch_state(&self) -> watch::Receiver<SubmissionState> {
        self.state.clone()
    }

    /// Wait for inclusion or failure.
    pub async fn wait(self) -> Result<VerificationRecord, SubmissionError> {
        self.outcome
            .await
            .unwrap_or_else(|_| Err(SubmissionError::TransportDropped {
                reason: "inclusion tracking stopped".into(),
            }))
    }
}

pub struct VerificationService {
    manager: Mutex<ConnectionManager>,
    signer: Option<Arc<dyn SigningDelegate>>,
    clock: Arc<dyn Clock>,
    cache: Arc<SessionCache>,
    accounts: RwLock<AccountState>,
    stats: Arc<ServiceStats>,
    options: ServiceOptions,
}

impl VerificationService {
    pub fn new(
        manager: ConnectionManager,
        signer: Option<Arc<dyn SigningDelegate>>,
        clock: Arc<dyn Clock>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            manager: Mutex::new(manager),
            signer,
            clock,
            cache: Arc::new(SessionCache::new()),
            accounts: RwLock::new(AccountState::default()),
            stats: Arc::new(ServiceStats::default()),
            options,
        }
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    // ── Accounts ────────────────────────────────────────────────────────

    /// Ask the signing delegate for its accounts and select the first.
    pub async fn connect_account(&self) -> Result<Account, ServiceError> {
        let signer = self.signer.as_ref().ok_or(AuthError::NoProvider)?;
        let accounts = signer
            .list_accounts()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        let first = accounts.first().cloned().ok_or(AuthError::NoAccounts)?;

        let mut state = self.accounts.write().await;
        state.accounts = accounts;
        state.selected = Some(first.clone());
        tracing::info!(account = %first, available = state.accounts.len(), "account connected");
        Ok(first)
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.accounts.read().await.accounts.clone()
    }

    pub async fn selected_account(&self) -> Option<Account> {
        self.accounts.read().await.selected.clone()
    }

    /// Select one of the listed accounts by address.
    pub async fn select_account(&self, address: &str) -> Result<Account, ServiceError> {
        let mut state = self.accounts.write().await;
        let account = state
            .accounts
            .iter()
            .find(|a| a.address == address)
            .cloned()
            .ok_or_else(|| AuthError::UnknownAccount(address.to_string()))?;
        state.selected = Some(account.clone());
        Ok(account)
    }

    /// Re-list accounts after a network change, keeping the selection if the
    /// provider still offers it. Provider errors leave the list untouched.
    async fn refresh_accounts(&self) {
        let Some(signer) = &self.signer else {
            return;
        };
        let accounts = match signer.list_accounts().await {
            Ok(accounts) if !accounts.is_empty() => accounts,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(error = %e, "could not refresh accounts");
                return;
            }
        };

        let mut state = self.accounts.write().await;
        let keep = state
            .selected
            .as_ref()
            .filter(|s| accounts.contains(s))
            .cloned();
        state.selected = keep.or_else(|| accounts.first().cloned());
        state.accounts = accounts;
    }

    // ── Connection ──────────────────────────────────────────────────────

    /// Connect to `network`, or to the registry default.
    pub async fn connect(&self, network: Option<&NetworkId>) -> Result<Connection, ServiceError> {
        let mut manager = self.manager.lock().await;
        let network = match network {
            Some(id) => id.clone(),
            None => manager.registry().default_network().clone(),
        };
        Ok(manager.connect(&network, &self.options.connect).await?)
    }

    /// Tear down the current connection and connect to `network`.
    ///
    /// On failure the service is left disconnected.
    pub async fn switch_network(&self, network: &NetworkId) -> Result<Connection, ServiceError> {
        let conn = {
            let mut manager = self.manager.lock().await;
            manager.switch_network(network, &self.options.connect).await?
        };
        self.refresh_accounts().await;
        tracing::info!(network = %network, endpoint = %conn.endpoint(), "switched network");
        Ok(conn)
    }

    /// Disconnect and forget the account list. Cached records survive.
    pub async fn disconnect(&self) {
        self.manager.lock().await.disconnect().await;
        *self.accounts.write().await = AccountState::default();
    }

    pub async fn is_connected(&self) -> bool {
        self.manager.lock().await.is_connected()
    }

    pub async fn current_network(&self) -> Option<NetworkId> {
        self.manager.lock().await.current_network().cloned()
    }

    async fn live_connection(&self) -> Result<Connection, ServiceError> {
        self.manager
            .lock()
            .await
            .current()
            .filter(|c| c.is_live())
            .cloned()
            .ok_or_else(|| ServiceError::NotReady("not connected to a network".into()))
    }

    // ── Submission ──────────────────────────────────────────────────────

    /// Hash `content`, record it on the current network, and return a handle
    /// that resolves once the ledger includes or rejects the operation.
    pub async fn begin_submit(
        &self,
        content: &[u8],
        request: SubmissionRequest,
    ) -> Result<Submission, ServiceError> {
        let account = self
            .selected_account()
            .await
            .ok_or_else(|| ServiceError::NotReady("no account selected".into()))?;
        let signer = self.signer.clone().ok_or(AuthError::NoProvider)?;

        let (tracker, state) = StateTracker::new();
        tracker.advance(SubmissionState::Connecting);
        let manager = self.manager.lock().await;
        let conn = manager
            .current()
            .filter(|c| c.is_live())
            .cloned()
            .ok_or_else(|| ServiceError::NotReady("not connected to a network".into()))?;

        let subject_hash = content_digest(content);
        let record = request.into_record(subject_hash, conn.network_id().clone(), self.clock.now());
        let payload = attest_protocol::encode(&record).map_err(SubmissionError::from)?;

        tracker.advance(SubmissionState::Submitting);
        self.stats.record_submission();
        tracing::info!(
            subject = %subject_hash,
            network = %conn.network_id(),
            account = %account.address,
            bytes = payload.len(),
            "submitting record"
        );
        let operation = match signer
            .sign_and_submit(conn.link().as_ref(), payload.as_bytes(), &account)
            .await
        {
            Ok(operation) => operation,
            Err(e) => {
                let error = classify_signer_error(e);
                tracing::warn!(subject = %subject_hash, error = %error, "submission refused");
                self.stats.record_submission_failure();
                tracker.advance(SubmissionState::Failed);
                return Err(error.into());
            }
        };
        drop(manager);

        tracker.advance(SubmissionState::AwaitingInclusion);
        let (outcome_tx, outcome) = oneshot::channel();
        let (published, record) = watch::channel(record);
        let inclusion = Inclusion {
            published,
            link: Arc::clone(conn.link()),
            cache: Arc::clone(&self.cache),
            stats: Arc::clone(&self.stats),
            tracker,
        };
        tokio::spawn(async move {
            let result = inclusion.run(operation).await;
            let _ = outcome_tx.send(result);
        });

        Ok(Submission {
            record,
            state,
            outcome,
        })
    }

    /// [`begin_submit`](Self::begin_submit) and wait for the outcome.
    pub async fn submit(
        &self,
        content: &[u8],
        request: SubmissionRequest,
    ) -> Result<VerificationRecord, ServiceError> {
        let submission = self.begin_submit(content, request).await?;
        Ok(submission.wait().await?)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Find the record for `hash`: the session cache first, then recent
    /// ledger activity on the current network. `Ok(None)` means not found.
    pub async fn verify(&self, hash: &SubjectHash) -> Result<Option<VerificationRecord>, ServiceError> {
        if let Some(record) = self.cache.get(hash).await {
            self.stats.record_cache_hit();
            tracing::debug!(subject = %hash, "verified from cache");
            return Ok(Some(record));
        }

        let conn = self.live_connection().await?;
        self.stats.record_ledger_scan();
        let activity = conn
            .link()
            .recent_activity(self.options.scan_depth)
            .await
            .map_err(|e| QueryError::TransportFailure(e.to_string()))?;

        // oldest first, so the last match is the most recent observation
        let found = activity
            .iter()
            .filter_map(|item| {
                attest_protocol::decode(&item.payload)
                    .filter(|r| &r.subject_hash == hash)
                    .map(|r| (item, r))
            })
            .last();

        let Some((item, record)) = found else {
            self.stats.record_not_found();
            tracing::info!(subject = %hash, network = %conn.network_id(), depth = self.options.scan_depth, "record not found");
            return Ok(None);
        };

        let mut record = record.observed_at(
            conn.network_id().clone(),
            item.block_number,
            item.transaction_reference.clone(),
        );
        record
            .metadata
            .insert("blockHash".into(), item.block_hash.clone().into());
        tracing::info!(subject = %hash, block = item.block_number, "verified from ledger");
        self.cache.put(record.clone()).await;
        Ok(Some(record))
    }

    /// Verify by content rather than by hash.
    pub async fn verify_content(&self, content: &[u8]) -> Result<Option<VerificationRecord>, ServiceError> {
        self.verify(&content_digest(content)).await
    }

    /// Records seen this session, most recent first.
    pub async fn list_records(&self) -> Vec<VerificationRecord> {
        self.cache.list().await
    }

    pub async fn chain_head(&self) -> Result<attest_network::ChainHead, ServiceError> {
        let conn = self.live_connection().await?;
        Ok(conn
            .link()
            .chain_head()
            .await
            .map_err(|e| QueryError::TransportFailure(e.to_string()))?)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Follows one operation to inclusion or failure.
struct Inclusion {
    /// The submitted record, replaced by its terminal form at the outcome.
    published: watch::Sender<VerificationRecord>,
    link: Arc<dyn LedgerLink>,
    cache: Arc<SessionCache>,
    stats: Arc<ServiceStats>,
    tracker: StateTracker,
}

impl Inclusion {
    async fn run(self, mut operation: OperationWatch) -> Result<VerificationRecord, SubmissionError> {
        let subject = self.published.borrow().subject_hash;
        let result = loop {
            let Some(status) = operation.updates.recv().await else {
                break Err(SubmissionError::TransportDropped {
                    reason: "status stream ended before inclusion".into(),
                });
            };
            if let Some(block_hash) = status.included_in() {
                break self.included(block_hash, &operation.transaction_reference).await;
            }
            if let Some(error) = classify_status(&status) {
                break Err(error);
            }
            if let OperationStatus::Retracted { block_hash } = &status {
                tracing::warn!(subject = %subject, block = %block_hash, "block retracted");
            } else {
                tracing::debug!(subject = %subject, status = ?status, "operation progress");
            }
        };

        match result {
            Ok(record) => {
                self.published.send_replace(record.clone());
                self.tracker.advance(SubmissionState::Finalized);
                Ok(record)
            }
            Err(error) => {
                let mut failed = self.published.borrow().clone();
                match failed.mark_failed() {
                    Ok(()) => {
                        self.published.send_replace(failed);
                    }
                    Err(e) => tracing::warn!(subject = %subject, error = %e, "record not marked failed"),
                }
                self.stats.record_submission_failure();
                self.tracker.advance(SubmissionState::Failed);
                tracing::warn!(subject = %subject, error = %error, "submission failed");
                Err(error)
            }
        }
    }

    async fn included(
        &self,
        block_hash: &str,
        transaction_reference: &str,
    ) -> Result<VerificationRecord, SubmissionError> {
        let number = self
            .link
            .block_number(block_hash)
            .await
            .map_err(|e| SubmissionError::TransportDropped {
                reason: format!("could not resolve block {block_hash}: {e}"),
            })?;

        let mut record = self.published.borrow().clone();
        record.mark_verified(number, transaction_reference)?;
        record
            .metadata
            .insert("blockHash".into(), block_hash.to_string().into());

        self.cache.put(record.clone()).await;
        self.stats.record_inclusion();
        tracing::info!(
            subject = %record.subject_hash,
            block = number,
            tx = %transaction_reference,
            "record included"
        );
        Ok(record)
    }
}
