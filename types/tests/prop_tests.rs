use proptest::prelude::*;

use attest_types::{NetworkId, SubjectHash, Timestamp};

proptest! {
    /// SubjectHash roundtrip: new -> to_hex -> from_hex produces identical hash.
    #[test]
    fn subject_hash_hex_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = SubjectHash::new(bytes);
        let parsed = SubjectHash::from_hex(&hash.to_hex()).unwrap();
        prop_assert_eq!(parsed.as_bytes(), &bytes);
    }

    /// Hex rendering is always 64 lowercase characters.
    #[test]
    fn subject_hash_hex_shape(bytes in prop::array::uniform32(0u8..)) {
        let hex = SubjectHash::new(bytes).to_hex();
        prop_assert_eq!(hex.len(), 64);
        prop_assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    /// SubjectHash JSON serialization roundtrip.
    #[test]
    fn subject_hash_json_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = SubjectHash::new(bytes);
        let encoded = serde_json::to_string(&hash).unwrap();
        let decoded: SubjectHash = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(decoded, hash);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Any non-empty identifier without whitespace is a valid network id.
    #[test]
    fn network_id_accepts_tokens(s in "[a-z][a-z0-9_]{0,20}") {
        let id = NetworkId::new(s.clone()).unwrap();
        prop_assert_eq!(id.as_str(), s.as_str());
    }
}
