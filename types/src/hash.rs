//! Content-addressed subject hash.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// A 32-byte digest of submitted content: the unique lookup key for a
/// verification record, both in the session cache and on the wire.
///
/// Always rendered as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectHash([u8; 32]);

impl SubjectHash {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a hex-encoded hash. Upper-case digits are accepted; a `0x`
    /// prefix is not.
    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        if s.len() != Self::HEX_LEN {
            return Err(TypesError::InvalidHash(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                s.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| TypesError::InvalidHash(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SubjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectHash({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for SubjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for SubjectHash {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for SubjectHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SubjectHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let hash = SubjectHash::new([0xab; 32]);
        let parsed = SubjectHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(parsed, hash);
        assert_eq!(hash.to_hex().len(), SubjectHash::HEX_LEN);
    }

    #[test]
    fn uppercase_is_normalised() {
        let upper = "AB".repeat(32);
        let hash = SubjectHash::from_hex(&upper).unwrap();
        assert_eq!(hash.to_string(), "ab".repeat(32));
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(matches!(
            SubjectHash::from_hex("abcd"),
            Err(TypesError::InvalidHash(_))
        ));
    }

    #[test]
    fn non_hex_rejected() {
        let bad = "zz".repeat(32);
        assert!(SubjectHash::from_hex(&bad).is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let hash = SubjectHash::new([1; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: SubjectHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
