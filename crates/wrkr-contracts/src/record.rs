//! Proof records and the chain that holds them.
//!
//! A `RecordDraft` is what the mapper produces: everything except identity
//! and integrity. The record builder turns a draft into a `Record` by
//! assigning a `RecordId`, linking it to the chain head, hashing, and
//! signing it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Payload;

/// Opaque identifier assigned to a record when it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Create a new, unique record id.
    pub fn new() -> Self {
        Self(format!("rec-{}", uuid::Uuid::new_v4().simple()))
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kind of governance event a record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    ScanFinding,
    RiskAssessment,
    Approval,
    Decision,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::ScanFinding => "scan_finding",
            RecordType::RiskAssessment => "risk_assessment",
            RecordType::Approval => "approval",
            RecordType::Decision => "decision",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission and scope assertions attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    pub permissions_enforced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within_scope: Option<bool>,
}

/// Hash-chain linkage and signature for one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Integrity {
    /// `record_hash` of the previous record, or `GENESIS_HASH` for record 0.
    pub previous_record_hash: String,
    /// SHA-256 (hex) over the canonical encoding of this record.
    pub record_hash: String,
    /// Base64 Ed25519 signature over the raw digest bytes.
    pub signature: String,
    pub signing_key_id: String,
}

/// A record before it is linked into a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub record_type: RecordType,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub source_product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub event: Payload,
    #[serde(default)]
    pub metadata: Payload,
    #[serde(default)]
    pub controls: Controls,
}

/// One immutable, signed, hash-linked ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub record_id: RecordId,
    pub record_type: RecordType,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub source_product: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub event: Payload,
    #[serde(default)]
    pub metadata: Payload,
    #[serde(default)]
    pub controls: Controls,
    pub integrity: Integrity,
}

impl Record {
    /// Combine a draft with its assigned id and integrity block.
    pub fn from_draft(record_id: RecordId, draft: RecordDraft, integrity: Integrity) -> Self {
        Self {
            record_id,
            record_type: draft.record_type,
            timestamp: draft.timestamp,
            source: draft.source,
            source_product: draft.source_product,
            agent_id: draft.agent_id,
            event: draft.event,
            metadata: draft.metadata,
            controls: draft.controls,
            integrity,
        }
    }
}

/// A named, append-only sequence of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub chain_id: String,
    pub records: Vec<Record>,
    /// `record_hash` of the last record, or `GENESIS_HASH` when empty.
    pub head_hash: String,
}

impl Chain {
    /// The sentinel `previous_record_hash` of the first record in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";

    /// An empty chain.
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            records: Vec::new(),
            head_hash: Self::GENESIS_HASH.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of the given type, in append order.
    pub fn records_of_type(&self, record_type: RecordType) -> impl Iterator<Item = &Record> {
        self.records
            .iter()
            .filter(move |r| r.record_type == record_type)
    }
}
