//! Record codec: tag framing and JSON serialization.

use attest_types::VerificationRecord;
use serde_json::{Map, Value};

use crate::ProtocolError;

/// Marks a payload as one of our records.
pub const RECORD_TAG: &str = "ATTEST_RECORD";

/// Maximum encoded payload size in bytes, tag included.
pub const MAX_PAYLOAD_SIZE: usize = 32 * 1024; // 32 KiB

const SEPARATOR: u8 = b':';

/// Encode a record as `ATTEST_RECORD:<json>`.
///
/// Field order is fixed and attribute/metadata keys are sorted, so equal
/// records always encode to identical bytes.
pub fn encode(record: &VerificationRecord) -> Result<String, ProtocolError> {
    let json =
        serde_json::to_string(record).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
    let payload = format!("{RECORD_TAG}:{json}");
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }
    Ok(payload)
}

/// Whether `raw` starts with the record tag and separator.
pub fn is_tagged(raw: &[u8]) -> bool {
    raw.len() > RECORD_TAG.len()
        && raw.starts_with(RECORD_TAG.as_bytes())
        && raw[RECORD_TAG.len()] == SEPARATOR
}

/// Decode a payload recovered from the ledger.
///
/// Returns `None` for untagged, oversized or malformed input. Top-level
/// fields this version does not know are moved into `metadata` (without
/// overwriting a metadata key of the same name).
pub fn decode(raw: &[u8]) -> Option<VerificationRecord> {
    if raw.len() > MAX_PAYLOAD_SIZE || !is_tagged(raw) {
        return None;
    }
    let body = &raw[RECORD_TAG.len() + 1..];
    let Value::Object(mut fields) = serde_json::from_slice::<Value>(body).ok()? else {
        return None;
    };

    let unknown: Vec<String> = fields
        .keys()
        .filter(|k| !VerificationRecord::FIELDS.contains(&k.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        let mut metadata = match fields.remove("metadata") {
            Some(Value::Object(m)) => m,
            None | Some(Value::Null) => Map::new(),
            Some(_) => return None,
        };
        for key in unknown {
            if let Some(value) = fields.remove(&key) {
                metadata.entry(key).or_insert(value);
            }
        }
        fields.insert("metadata".to_string(), Value::Object(metadata));
    }

    serde_json::from_value(Value::Object(fields)).ok()
}

/// [`decode`] for textual payloads.
pub fn decode_str(raw: &str) -> Option<VerificationRecord> {
    decode(raw.as_bytes())
}
