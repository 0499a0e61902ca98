//! Property tests for the record wire format.
//!
//! The opaque-data channel is shared with arbitrary foreign activity, so the
//! decoder must accept exactly what the encoder produces and nothing that
//! lacks the tag.

use proptest::prelude::*;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use attest_protocol::{decode, decode_str, encode, RECORD_TAG};
use attest_types::{NetworkId, RecordKind, RecordStatus, SubjectHash, Timestamp, VerificationRecord};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_kind() -> impl Strategy<Value = RecordKind> {
    prop_oneof![Just(RecordKind::File), Just(RecordKind::Certificate)]
}

fn arb_status() -> impl Strategy<Value = RecordStatus> {
    prop_oneof![
        Just(RecordStatus::Pending),
        Just(RecordStatus::Verified),
        Just(RecordStatus::Failed),
    ]
}

fn arb_metadata_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u64>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        ".{0,24}".prop_map(Value::from),
        Just(Value::Null),
    ]
}

fn arb_record() -> impl Strategy<Value = VerificationRecord> {
    (
        prop::array::uniform32(0u8..),
        ".{0,40}",
        arb_kind(),
        prop::collection::btree_map("[a-zA-Z_]{1,12}", ".{0,24}", 0..6),
        arb_status(),
        prop::option::of(any::<u64>()),
        prop::option::of("0x[0-9a-f]{64}"),
        "[a-z][a-z0-9_]{0,12}",
        any::<u64>(),
        prop::collection::btree_map("[a-zA-Z_]{1,12}", arb_metadata_value(), 0..4),
    )
        .prop_map(
            |(hash, name, kind, attributes, status, block, tx, network, at, meta)| {
                VerificationRecord {
                    subject_hash: SubjectHash::new(hash),
                    display_name: name,
                    record_type: kind,
                    attributes: attributes.into_iter().collect::<BTreeMap<_, _>>(),
                    status,
                    block_reference: block,
                    transaction_reference: tx,
                    network_id: NetworkId::new(network).unwrap(),
                    recorded_at: Timestamp::new(at),
                    metadata: meta.into_iter().collect::<Map<_, _>>(),
                }
            },
        )
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// decode(encode(r)) == r for every record.
    #[test]
    fn encode_decode_roundtrip(record in arb_record()) {
        let payload = encode(&record).unwrap();
        prop_assert_eq!(decode_str(&payload), Some(record));
    }

    /// Encoding is deterministic.
    #[test]
    fn encode_is_deterministic(record in arb_record()) {
        prop_assert_eq!(encode(&record).unwrap(), encode(&record.clone()).unwrap());
    }

    /// Bytes that do not start with the tag never decode.
    #[test]
    fn untagged_bytes_never_decode(raw in prop::collection::vec(any::<u8>(), 0..512)) {
        prop_assume!(!raw.starts_with(RECORD_TAG.as_bytes()));
        prop_assert_eq!(decode(&raw), None);
    }

    /// A valid record body without the tag is still rejected.
    #[test]
    fn bare_json_never_decodes(record in arb_record()) {
        let json = serde_json::to_string(&record).unwrap();
        prop_assert_eq!(decode_str(&json), None);
    }

    /// Arbitrary text after the tag never panics the decoder.
    #[test]
    fn tagged_garbage_is_total(body in ".{0,256}") {
        let _ = decode_str(&format!("{RECORD_TAG}:{body}"));
    }
}
