//! What the caller wants recorded.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use attest_types::{NetworkId, RecordKind, SubjectHash, Timestamp, VerificationRecord};

/// Descriptive part of a submission; the subject hash is computed from the
/// content at submission time.
///
/// `file` and `certificate` pre-set the record kind; the typed setters fill
/// the attributes each kind conventionally carries.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionRequest {
    kind: RecordKind,
    display_name: String,
    attributes: BTreeMap<String, String>,
    metadata: Map<String, Value>,
}

impl SubmissionRequest {
    pub fn new(kind: RecordKind, display_name: impl Into<String>) -> Self {
        Self {
            kind,
            display_name: display_name.into(),
            attributes: BTreeMap::new(),
            metadata: Map::new(),
        }
    }

    pub fn file(display_name: impl Into<String>) -> Self {
        Self::new(RecordKind::File, display_name)
    }

    pub fn certificate(display_name: impl Into<String>) -> Self {
        Self::new(RecordKind::Certificate, display_name)
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    // File attributes

    pub fn location(self, location: impl Into<String>) -> Self {
        self.attribute("location", location)
    }

    pub fn size(self, bytes: u64) -> Self {
        self.attribute("size", bytes.to_string())
    }

    pub fn mime_type(self, mime: impl Into<String>) -> Self {
        self.attribute("mimeType", mime)
    }

    pub fn last_modified(self, at: Timestamp) -> Self {
        self.attribute("lastModified", at.as_millis().to_string())
    }

    // Certificate attributes

    pub fn certificate_type(self, kind: impl Into<String>) -> Self {
        self.attribute("certificateType", kind)
    }

    pub fn issuer(self, issuer: impl Into<String>) -> Self {
        self.attribute("issuer", issuer)
    }

    pub fn recipient(self, recipient: impl Into<String>) -> Self {
        self.attribute("recipient", recipient)
    }

    pub fn issue_date(self, date: impl Into<String>) -> Self {
        self.attribute("issueDate", date)
    }

    pub fn expiry_date(self, date: impl Into<String>) -> Self {
        self.attribute("expiryDate", date)
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Build the pending record; `metadata.timestamp` is the submission time.
    pub(crate) fn into_record(
        self,
        subject_hash: SubjectHash,
        network_id: NetworkId,
        now: Timestamp,
    ) -> VerificationRecord {
        let mut metadata = self.metadata;
        metadata.insert("timestamp".into(), Value::from(now.as_millis()));
        VerificationRecord::pending(
            subject_hash,
            self.display_name,
            self.kind,
            self.attributes,
            network_id,
            now,
            metadata,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_types::RecordStatus;
    use serde_json::json;

    #[test]
    fn certificate_builder_fills_attributes() {
        let request = SubmissionRequest::certificate("diploma.pdf")
            .certificate_type("degree")
            .issuer("ACME")
            .recipient("Alice")
            .issue_date("2024-06-01");
        assert_eq!(request.kind(), RecordKind::Certificate);

        let record = request.into_record(
            SubjectHash::new([1; 32]),
            NetworkId::new("paseo").unwrap(),
            Timestamp::new(1_700_000_000_000),
        );
        assert_eq!(record.status, RecordStatus::Pending);
        assert_eq!(record.attribute("issuer"), Some("ACME"));
        assert_eq!(record.attribute("recipient"), Some("Alice"));
        assert_eq!(record.attribute("issueDate"), Some("2024-06-01"));
        assert_eq!(record.metadata["timestamp"], json!(1_700_000_000_000u64));
        assert_eq!(record.recorded_at, Timestamp::new(1_700_000_000_000));
    }

    #[test]
    fn file_builder_fills_attributes() {
        let record = SubmissionRequest::file("hello.txt")
            .location("/tmp/hello.txt")
            .size(9)
            .mime_type("text/plain")
            .metadata("origin", json!("cli"))
            .into_record(
                SubjectHash::new([2; 32]),
                NetworkId::new("kusama").unwrap(),
                Timestamp::new(5),
            );
        assert_eq!(record.record_type, RecordKind::File);
        assert_eq!(record.attribute("size"), Some("9"));
        assert_eq!(record.attribute("mimeType"), Some("text/plain"));
        assert_eq!(record.metadata["origin"], json!("cli"));
        assert_eq!(record.metadata["timestamp"], json!(5));
    }
}
