//! Chain verification report.

use serde::{Deserialize, Serialize};

use crate::error::{WrkrError, WrkrResult};

/// `reason` of an intact chain.
pub const REASON_OK: &str = "ok";
/// `reason` of a chain with a hash, link, or signature mismatch.
pub const REASON_INTEGRITY_FAILURE: &str = "chain_integrity_failure";

/// The result of replaying a chain's hashes and signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub intact: bool,
    /// Number of records in the chain.
    pub count: usize,
    /// The chain's stored head hash.
    pub head_hash: String,
    /// Record id of the first corrupted record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_point: Option<String>,
    /// Position of the first corrupted record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_index: Option<usize>,
    pub reason: String,
    /// Which check failed (e.g. `record_hash_mismatch`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl VerificationResult {
    pub fn intact(count: usize, head_hash: impl Into<String>) -> Self {
        Self {
            intact: true,
            count,
            head_hash: head_hash.into(),
            break_point: None,
            break_index: None,
            reason: REASON_OK.to_string(),
            detail: None,
        }
    }

    pub fn broken(
        count: usize,
        head_hash: impl Into<String>,
        index: usize,
        record_id: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            intact: false,
            count,
            head_hash: head_hash.into(),
            break_point: Some(record_id.into()),
            break_index: Some(index),
            reason: REASON_INTEGRITY_FAILURE.to_string(),
            detail: Some(detail.into()),
        }
    }

    /// Turn a failed verification into `WrkrError::IntegrityFailure`.
    pub fn into_result(self) -> WrkrResult<Self> {
        if self.intact {
            return Ok(self);
        }
        Err(WrkrError::IntegrityFailure {
            index: self.break_index.unwrap_or_default(),
            record_id: self.break_point.clone().unwrap_or_default(),
            reason: self.detail.clone().unwrap_or_else(|| self.reason.clone()),
        })
    }
}
