//! Verification records.
//!
//! A record is created `Pending` when its content is submitted and moves
//! exactly once, to `Verified` (included in a block) or `Failed`. All other
//! fields are fixed at creation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::{NetworkId, SubjectHash, Timestamp, TypesError};

/// Which attribute schema a record follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Any file; attributes carry location, size, media type.
    File,
    /// A certificate; attributes carry type, issuer, recipient, dates.
    Certificate,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Certificate => "certificate",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Verified,
    Failed,
}

impl RecordStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Failed => "failed",
        })
    }
}

/// A content hash recorded against a ledger, together with descriptive
/// attributes and, once included, where it landed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub subject_hash: SubjectHash,
    pub display_name: String,
    pub record_type: RecordKind,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reference: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_reference: Option<String>,
    pub network_id: NetworkId,
    #[serde(default)]
    pub recorded_at: Timestamp,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl VerificationRecord {
    /// Field names used on the wire. Anything else found in a payload is
    /// carried in `metadata`.
    pub const FIELDS: &'static [&'static str] = &[
        "subjectHash",
        "displayName",
        "recordType",
        "attributes",
        "status",
        "blockReference",
        "transactionReference",
        "networkId",
        "recordedAt",
        "metadata",
    ];

    /// Create a new record awaiting inclusion.
    pub fn pending(
        subject_hash: SubjectHash,
        display_name: impl Into<String>,
        record_type: RecordKind,
        attributes: BTreeMap<String, String>,
        network_id: NetworkId,
        recorded_at: Timestamp,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            subject_hash,
            display_name: display_name.into(),
            record_type,
            attributes,
            status: RecordStatus::Pending,
            block_reference: None,
            transaction_reference: None,
            network_id,
            recorded_at,
            metadata,
        }
    }

    /// `Pending` → `Verified`, recording the containing block and operation.
    pub fn mark_verified(
        &mut self,
        block_reference: u64,
        transaction_reference: impl Into<String>,
    ) -> Result<(), TypesError> {
        self.transition(RecordStatus::Verified)?;
        self.block_reference = Some(block_reference);
        self.transaction_reference = Some(transaction_reference.into());
        Ok(())
    }

    /// `Pending` → `Failed`.
    pub fn mark_failed(&mut self) -> Result<(), TypesError> {
        self.transition(RecordStatus::Failed)
    }

    /// A record as found on the ledger: whatever status it was written with,
    /// being on-chain makes it `Verified` at the observed location.
    pub fn observed_at(
        mut self,
        network_id: NetworkId,
        block_reference: u64,
        transaction_reference: impl Into<String>,
    ) -> Self {
        self.status = RecordStatus::Verified;
        self.network_id = network_id;
        self.block_reference = Some(block_reference);
        self.transaction_reference = Some(transaction_reference.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn transition(&mut self, to: RecordStatus) -> Result<(), TypesError> {
        if self.status != RecordStatus::Pending {
            return Err(TypesError::IllegalTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
