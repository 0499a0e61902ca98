//! End-to-end service behaviour over nullable infrastructure.

use std::sync::Arc;
use std::time::Duration;

use attest_crypto::content_digest;
use attest_network::{
    ConnectOptions, ConnectionError, ConnectionManager, LinkError, OperationStatus, SigningDelegate,
};
use attest_nullables::{NullClock, NullLink, NullSigner, NullTransport};
use attest_registry::NetworkRegistry;
use attest_types::{
    Account, NetworkDescriptor, NetworkId, RecordKind, RecordStatus, SubjectHash, VerificationRecord,
};
use attest_verification::{
    AuthError, ServiceError, ServiceOptions, SubmissionError, SubmissionRequest, SubmissionState,
    VerificationService,
};

const NOW: u64 = 1_700_000_000_000;

fn id(s: &str) -> NetworkId {
    NetworkId::new(s).unwrap()
}

fn alice() -> Account {
    Account::new("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY", "Alice")
}

fn bob() -> Account {
    Account::new("5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty", "Bob")
}

struct Harness {
    service: VerificationService,
    transport: Arc<NullTransport>,
    signer: Arc<NullSigner>,
    /// Handed out for the primary `paseo` endpoint.
    link: Arc<NullLink>,
}

fn harness_with(signer: Option<Arc<NullSigner>>) -> Harness {
    let registry = NetworkRegistry::new(
        vec![
            NetworkDescriptor::new(
                id("paseo"),
                "Paseo",
                vec!["ws://a".into(), "ws://b".into(), "ws://c".into()],
            ),
            NetworkDescriptor::new(id("kusama"), "Kusama", vec!["ws://k".into()]),
        ],
        id("paseo"),
    )
    .unwrap();

    let transport = Arc::new(NullTransport::new());
    let link = Arc::new(NullLink::new("ws://a"));
    transport.prepare(Arc::clone(&link));

    let manager = ConnectionManager::new(Arc::new(registry), Arc::clone(&transport) as _);
    let options = ServiceOptions {
        connect: ConnectOptions {
            per_endpoint_timeout: Duration::from_millis(50),
            overall_timeout: Duration::from_secs(5),
        },
        scan_depth: 100,
    };
    let fallback = Arc::new(NullSigner::default());
    let service = VerificationService::new(
        manager,
        signer.clone().map(|s| s as Arc<dyn SigningDelegate>),
        Arc::new(NullClock::new(NOW)),
        options,
    );
    Harness {
        service,
        transport,
        signer: signer.unwrap_or(fallback),
        link,
    }
}

fn harness() -> Harness {
    harness_with(Some(Arc::new(NullSigner::new(vec![alice(), bob()]))))
}

async fn ready() -> Harness {
    let h = harness();
    h.service.connect(None).await.unwrap();
    h.service.connect_account().await.unwrap();
    h
}

fn certificate() -> SubmissionRequest {
    SubmissionRequest::certificate("hello-doc")
        .issuer("ACME")
        .recipient("Alice")
}

fn foreign_record(content: &[u8]) -> VerificationRecord {
    VerificationRecord::pending(
        content_digest(content),
        "contract.pdf",
        RecordKind::File,
        Default::default(),
        id("paseo"),
        attest_types::Timestamp::new(NOW - 60_000),
        Default::default(),
    )
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// SHA-256 of the bytes `hello-doc`.
const HELLO_DOC_SHA256: &str = "d1c627ff5ecb73c384b004462aa74f8940918a1b39a704e35e46c2526c010640";

#[tokio::test]
async fn submit_then_verify_from_cache() {
    let h = ready().await;
    h.link.set_transaction_reference("tx-xyz");

    let submission = h.service.begin_submit(b"hello-doc", certificate()).await.unwrap();
    let pending = submission.record();
    assert_eq!(pending.status, RecordStatus::Pending);
    assert_eq!(pending.subject_hash.to_hex(), HELLO_DOC_SHA256);
    assert_eq!(pending.subject_hash.to_hex().len(), 64);
    assert_eq!(submission.state(), SubmissionState::AwaitingInclusion);
    assert!(h.link.include("0xb100", 100));

    let record = submission.wait().await.unwrap();
    assert_eq!(record.status, RecordStatus::Verified);
    assert_eq!(record.block_reference, Some(100));
    assert_eq!(record.transaction_reference.as_deref(), Some("tx-xyz"));
    assert_eq!(record.subject_hash.to_hex(), HELLO_DOC_SHA256);
    assert_eq!(record.network_id, id("paseo"));
    assert_eq!(record.attribute("issuer"), Some("ACME"));
    assert_eq!(record.attribute("recipient"), Some("Alice"));
    assert_eq!(record.metadata["timestamp"], serde_json::json!(NOW));
    assert_eq!(record.metadata["blockHash"], serde_json::json!("0xb100"));

    let hash: SubjectHash = HELLO_DOC_SHA256.parse().unwrap();
    let verified = h.service.verify(&hash).await.unwrap();
    assert_eq!(verified, Some(record));
    assert_eq!(h.link.scan_count(), 0);
    assert_eq!(h.service.stats().cache_hits, 1);
}

#[tokio::test]
async fn submitted_payload_is_a_tagged_record() {
    let h = ready().await;
    let submission = h.service.begin_submit(b"hello", certificate()).await.unwrap();

    let submitted = h.link.submitted();
    assert_eq!(submitted.len(), 1);
    let decoded = attest_protocol::decode(&submitted[0]).unwrap();
    assert_eq!(decoded, submission.record());

    let signed = h.signer.signed();
    assert_eq!(signed[0].0, alice().address);
}

#[tokio::test]
async fn state_ends_finalized() {
    let h = ready().await;
    let submission = h.service.begin_submit(b"doc", SubmissionRequest::file("doc.txt")).await.unwrap();
    let mut state = submission.watch_state();

    h.link.emit(OperationStatus::Ready);
    h.link.emit(OperationStatus::Broadcast);
    h.link.include("0xb7", 7);

    state.wait_for(|s| s.is_terminal()).await.unwrap();
    assert_eq!(*state.borrow(), SubmissionState::Finalized);
    assert_eq!(submission.record().status, RecordStatus::Verified);
    assert_eq!(submission.wait().await.unwrap().block_reference, Some(7));
}

#[tokio::test]
async fn fee_failure_is_insufficient_balance() {
    let h = ready().await;
    let submission = h.service.begin_submit(b"poor", certificate()).await.unwrap();
    let mut state = submission.watch_state();
    h.link.emit(OperationStatus::Invalid {
        reason: "Inability to pay some fees (e.g. account balance too low)".into(),
    });

    state.wait_for(|s| s.is_terminal()).await.unwrap();
    assert_eq!(*state.borrow(), SubmissionState::Failed);
    let failed = submission.record();
    assert_eq!(failed.status, RecordStatus::Failed);
    assert_eq!(failed.block_reference, None);

    let err = submission.wait().await.unwrap_err();
    assert!(matches!(err, SubmissionError::InsufficientBalance { .. }), "{err:?}");
    assert!(h.service.list_records().await.is_empty());
    assert_eq!(h.service.stats().submission_failures, 1);
}

#[tokio::test]
async fn rpc_balance_rejection_is_insufficient_balance() {
    let h = ready().await;
    h.link.fail_submissions(LinkError::Rpc {
        code: 1010,
        message: "Invalid Transaction: Inability to pay some fees".into(),
    });

    let err = h.service.submit(b"poor", certificate()).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Submission(SubmissionError::InsufficientBalance { .. })
    ));
}

#[tokio::test]
async fn dispatch_error_is_module_rejection() {
    let h = ready().await;
    let submission = h.service.begin_submit(b"x", certificate()).await.unwrap();
    h.link.emit(OperationStatus::DispatchFailed {
        module: Some("System.CallFiltered".into()),
        reason: "call filtered".into(),
    });
    assert!(matches!(
        submission.wait().await,
        Err(SubmissionError::ModuleRejected { .. })
    ));
}

#[tokio::test]
async fn closed_status_stream_is_transport_dropped() {
    let h = ready().await;
    let submission = h.service.begin_submit(b"x", certificate()).await.unwrap();
    h.link.drop_watchers();
    assert!(matches!(
        submission.wait().await,
        Err(SubmissionError::TransportDropped { .. })
    ));
}

#[tokio::test]
async fn submit_needs_an_account() {
    let h = harness();
    h.service.connect(None).await.unwrap();
    assert!(matches!(
        h.service.submit(b"x", certificate()).await,
        Err(ServiceError::NotReady(_))
    ));
    assert!(h.link.submitted().is_empty());
}

#[tokio::test]
async fn submit_needs_a_connection() {
    let h = harness();
    h.service.connect_account().await.unwrap();
    assert!(matches!(
        h.service.submit(b"x", certificate()).await,
        Err(ServiceError::NotReady(_))
    ));
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_hash_is_not_found() {
    let h = ready().await;
    h.link.push_activity(5, "0x05", "tx-5", b"unrelated remark".to_vec());

    let result = h.service.verify(&SubjectHash::new([0xee; 32])).await.unwrap();
    assert_eq!(result, None);
    assert_eq!(h.link.scan_count(), 1);
    assert_eq!(h.service.stats().not_found, 1);
}

#[tokio::test]
async fn ledger_record_is_found_and_cached() {
    let h = ready().await;
    let on_chain = foreign_record(b"contract");
    let payload = attest_protocol::encode(&on_chain).unwrap();
    h.link.push_activity(41, "0x29", "tx-41", b"junk".to_vec());
    h.link.push_activity(42, "0x2a", "tx-42", payload.into_bytes());

    let hash = content_digest(b"contract");
    let found = h.service.verify(&hash).await.unwrap().unwrap();
    assert_eq!(found.status, RecordStatus::Verified);
    assert_eq!(found.block_reference, Some(42));
    assert_eq!(found.transaction_reference.as_deref(), Some("tx-42"));
    assert_eq!(found.display_name, "contract.pdf");
    assert_eq!(found.metadata["blockHash"], serde_json::json!("0x2a"));

    // second lookup is served from the cache
    assert_eq!(h.service.verify(&hash).await.unwrap(), Some(found));
    assert_eq!(h.link.scan_count(), 1);
}

#[tokio::test]
async fn latest_observation_wins() {
    let h = ready().await;
    let record = foreign_record(b"contract");
    let payload = attest_protocol::encode(&record).unwrap();
    h.link.push_activity(10, "0x0a", "tx-old", payload.clone().into_bytes());
    h.link.push_activity(20, "0x14", "tx-new", payload.into_bytes());

    let found = h.service.verify(&content_digest(b"contract")).await.unwrap().unwrap();
    assert_eq!(found.block_reference, Some(20));
    assert_eq!(found.transaction_reference.as_deref(), Some("tx-new"));
}

#[tokio::test]
async fn records_beyond_scan_depth_are_not_found() {
    let h = ready().await;
    let payload = attest_protocol::encode(&foreign_record(b"ancient")).unwrap();
    h.link.push_activity(1, "0x01", "tx-1", payload.into_bytes());
    h.link.set_head(500, "0x1f4");

    assert_eq!(h.service.verify(&content_digest(b"ancient")).await.unwrap(), None);
}

#[tokio::test]
async fn verify_on_cache_miss_needs_connection() {
    let h = harness();
    let err = h.service.verify(&SubjectHash::new([1; 32])).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotReady(_)));
}

#[tokio::test]
async fn query_failure_is_reported() {
    let h = ready().await;
    h.link.fail_queries(LinkError::Timeout("chain_getBlock".into()));
    let err = h.service.verify(&SubjectHash::new([1; 32])).await.unwrap_err();
    assert!(matches!(err, ServiceError::Query(_)));
}

#[tokio::test]
async fn cached_records_survive_disconnect() {
    let h = ready().await;
    let submission = h.service.begin_submit(b"keep", certificate()).await.unwrap();
    h.link.include("0x01", 1);
    submission.wait().await.unwrap();

    h.service.disconnect().await;
    assert!(!h.service.is_connected().await);
    assert!(h.service.accounts().await.is_empty());
    assert!(h.service.verify(&content_digest(b"keep")).await.unwrap().is_some());
}

#[tokio::test]
async fn list_records_most_recent_first() {
    let h = ready().await;
    for (i, content) in [&b"one"[..], b"two", b"three"].into_iter().enumerate() {
        let submission = h
            .service
            .begin_submit(content, SubmissionRequest::file(format!("f{i}")))
            .await
            .unwrap();
        h.link.include(&format!("0x{i}"), i as u64);
        submission.wait().await.unwrap();
    }
    let names: Vec<String> = h
        .service
        .list_records()
        .await
        .into_iter()
        .map(|r| r.display_name)
        .collect();
    assert_eq!(names, vec!["f2", "f1", "f0"]);
}

// ---------------------------------------------------------------------------
// Accounts and networks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_provider() {
    let h = harness_with(None);
    assert!(matches!(
        h.service.connect_account().await,
        Err(ServiceError::Auth(AuthError::NoProvider))
    ));
}

#[tokio::test]
async fn provider_without_accounts() {
    let h = harness_with(Some(Arc::new(NullSigner::new(vec![]))));
    assert!(matches!(
        h.service.connect_account().await,
        Err(ServiceError::Auth(AuthError::NoAccounts))
    ));
    assert_eq!(h.service.selected_account().await, None);
}

#[tokio::test]
async fn first_account_selected_and_switchable() {
    let h = harness();
    assert_eq!(h.service.connect_account().await.unwrap(), alice());
    assert_eq!(h.service.accounts().await, vec![alice(), bob()]);

    assert_eq!(h.service.select_account(&bob().address).await.unwrap(), bob());
    assert_eq!(h.service.selected_account().await, Some(bob()));
    assert!(matches!(
        h.service.select_account("nobody").await,
        Err(ServiceError::Auth(AuthError::UnknownAccount(_)))
    ));
}

#[tokio::test]
async fn default_network_is_used() {
    let h = harness();
    let conn = h.service.connect(None).await.unwrap();
    assert_eq!(conn.network_id(), &id("paseo"));
    assert_eq!(conn.endpoint(), "ws://a");
    assert_eq!(h.service.current_network().await, Some(id("paseo")));
}

#[tokio::test]
async fn failover_reaches_third_endpoint() {
    let h = harness();
    h.transport.refuse("ws://a", "refused");
    h.transport.refuse("ws://b", "refused");
    let conn = h.service.connect(Some(&id("paseo"))).await.unwrap();
    assert_eq!(conn.endpoint(), "ws://c");
    assert_eq!(h.transport.attempts(), vec!["ws://a", "ws://b", "ws://c"]);
}

#[tokio::test]
async fn total_failure_reports_every_endpoint() {
    let h = harness();
    for endpoint in ["ws://a", "ws://b", "ws://c"] {
        h.transport.refuse(endpoint, "refused");
    }
    match h.service.connect(None).await {
        Err(ServiceError::Connection(ConnectionError::NoEndpointsAvailable {
            tried_endpoints, ..
        })) => assert_eq!(tried_endpoints.len(), 3),
        other => panic!("unexpected {other:?}"),
    }
    assert!(!h.service.is_connected().await);
}

#[tokio::test]
async fn switching_keeps_one_live_link_and_the_selection() {
    let h = ready().await;
    h.service.select_account(&bob().address).await.unwrap();

    h.service.switch_network(&id("kusama")).await.unwrap();
    h.service.switch_network(&id("paseo")).await.unwrap();

    assert_eq!(h.transport.max_live_links(), 1);
    assert_eq!(h.transport.live_links(), 1);
    assert_eq!(h.service.current_network().await, Some(id("paseo")));
    assert_eq!(h.service.selected_account().await, Some(bob()));
}

#[tokio::test]
async fn switch_falls_back_when_selection_disappears() {
    let h = ready().await;
    h.service.select_account(&bob().address).await.unwrap();
    h.signer.set_accounts(vec![alice()]);

    h.service.switch_network(&id("kusama")).await.unwrap();
    assert_eq!(h.service.selected_account().await, Some(alice()));
}

#[tokio::test]
async fn failed_switch_leaves_service_disconnected() {
    let h = ready().await;
    h.transport.refuse("ws://k", "refused");

    assert!(h.service.switch_network(&id("kusama")).await.is_err());
    assert!(!h.service.is_connected().await);
    assert!(matches!(
        h.service.submit(b"x", certificate()).await,
        Err(ServiceError::NotReady(_))
    ));
}

#[tokio::test]
async fn chain_head_from_live_link() {
    let h = ready().await;
    h.link.set_head(1234, "0xhead");
    let head = h.service.chain_head().await.unwrap();
    assert_eq!(head.number, 1234);
    assert_eq!(head.hash, "0xhead");
}
