//! Chain verifier.
//!
//! Verification of a chain file runs in two phases:
//!
//! 1. **Structural**: the file must exist, parse as JSON, and satisfy the
//!    chain document schema. Failures here are `ChainNotFound` or
//!    `ChainParse` errors, never `IntegrityFailure`.
//! 2. **Replay**: every record's hash is recomputed, its link to the
//!    previous record checked, and its signature verified under the key
//!    named by `signing_key_id`. The first mismatch is reported.
//!
//! File replay hashes each record object exactly as stored, so members the
//! `Record` type does not declare, or values it cannot decode, are covered
//! by the hash and surface as integrity failures.
//!
//! Verification never writes. It does not look at `source_product`, so
//! chains with records from cooperating systems verify the same way as long
//! as their keys are in the key ring.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use wrkr_contracts::{
    error::{WrkrError, WrkrResult},
    record::Chain,
    verify::VerificationResult,
};
use wrkr_core::{
    canonical,
    traits::{SignatureCheck, SignatureVerifier},
    StoreLayout,
};
use wrkr_proof::{load_verifier_key, KeyEnv, KeyRing, VerifierKey};

use crate::schema::chain_document_schema;

pub const DETAIL_RECORD_HASH: &str = "record_hash_mismatch";
pub const DETAIL_PREVIOUS_HASH: &str = "previous_hash_mismatch";
pub const DETAIL_UNKNOWN_KEY: &str = "unknown_signing_key";
pub const DETAIL_SIGNATURE: &str = "signature_invalid";
pub const DETAIL_HEAD_HASH: &str = "head_hash_mismatch";

/// Maximum schema violations quoted in a parse error.
const MAX_REPORTED_VIOLATIONS: usize = 5;

/// Replays proof chains against a ring of trusted public keys.
#[derive(Debug, Clone, Default)]
pub struct ChainVerifier {
    keys: KeyRing,
}

impl ChainVerifier {
    pub fn new(keys: KeyRing) -> Self {
        Self { keys }
    }

    /// A verifier trusting the store's own key.
    pub fn for_store(layout: &StoreLayout, env: &KeyEnv) -> WrkrResult<Self> {
        let key = load_verifier_key(layout, env)?;
        Ok(Self::new(KeyRing::new().with_key(key)))
    }

    /// Trust an additional signer, e.g. a cooperating product.
    pub fn add_key(&mut self, key: VerifierKey) {
        self.keys.insert(key);
    }

    /// Load and verify the chain file at `path`.
    pub fn verify_path(&self, path: &Path) -> WrkrResult<VerificationResult> {
        let document = load_document(path)?;
        let result = verify_document(&document, &self.keys);
        if result.intact {
            info!(path = %path.display(), count = result.count, head_hash = %result.head_hash, "chain intact");
        } else {
            warn!(
                path = %path.display(),
                break_index = ?result.break_index,
                break_point = ?result.break_point,
                detail = ?result.detail,
                "chain integrity failure"
            );
        }
        Ok(result)
    }

    pub fn verify(&self, chain: &Chain) -> VerificationResult {
        verify_chain(chain, &self.keys)
    }
}

/// Read `path`, check it against the chain schema, and decode it.
pub fn load_checked(path: &Path) -> WrkrResult<Chain> {
    let document = load_document(path)?;
    serde_json::from_value(document).map_err(|e| WrkrError::ChainParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Read `path` and check it against the chain schema without decoding
/// records.
pub fn load_document(path: &Path) -> WrkrResult<Value> {
    if !path.exists() {
        return Err(WrkrError::ChainNotFound {
            path: path.display().to_string(),
        });
    }
    let parse_error = |reason: String| WrkrError::ChainParse {
        path: path.display().to_string(),
        reason,
    };

    let text = std::fs::read_to_string(path).map_err(|e| WrkrError::Io {
        reason: format!("failed to read chain '{}': {e}", path.display()),
    })?;
    let document: Value = serde_json::from_str(&text).map_err(|e| parse_error(e.to_string()))?;

    let schema = chain_document_schema();
    let validator = jsonschema::validator_for(&schema).map_err(|e| WrkrError::ConfigError {
        reason: format!("invalid chain document schema: {e}"),
    })?;
    let violations: Vec<String> = validator
        .iter_errors(&document)
        .take(MAX_REPORTED_VIOLATIONS)
        .map(|error| format!("{}: {}", error.instance_path, error))
        .collect();
    if !violations.is_empty() {
        return Err(parse_error(violations.join("; ")));
    }
    Ok(document)
}

// ── Replay ────────────────────────────────────────────────────────────────────

/// The fields replay reads from one record, plus its recomputed digest.
struct Sealed<'a> {
    record_id: &'a str,
    digest: WrkrResult<[u8; 32]>,
    previous_record_hash: &'a str,
    record_hash: &'a str,
    signature: &'a str,
    signing_key_id: &'a str,
}

/// Replay an in-memory `chain`, stopping at the first mismatch.
pub fn verify_chain(chain: &Chain, keys: &dyn SignatureVerifier) -> VerificationResult {
    let sealed = chain.records.iter().map(|record| Sealed {
        record_id: record.record_id.0.as_str(),
        digest: canonical::record_digest(record),
        previous_record_hash: &record.integrity.previous_record_hash,
        record_hash: &record.integrity.record_hash,
        signature: &record.integrity.signature,
        signing_key_id: &record.integrity.signing_key_id,
    });
    replay(chain.records.len(), &chain.head_hash, sealed, keys)
}

/// Replay a schema-checked chain document, hashing each record object as
/// stored.
pub fn verify_document(document: &Value, keys: &dyn SignatureVerifier) -> VerificationResult {
    let records: &[Value] = document
        .get("records")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let sealed = records.iter().map(|stored| Sealed {
        record_id: text_at(stored, &["record_id"]),
        digest: canonical::stored_record_digest(stored),
        previous_record_hash: text_at(stored, &["integrity", "previous_record_hash"]),
        record_hash: text_at(stored, &["integrity", "record_hash"]),
        signature: text_at(stored, &["integrity", "signature"]),
        signing_key_id: text_at(stored, &["integrity", "signing_key_id"]),
    });
    replay(records.len(), text_at(document, &["head_hash"]), sealed, keys)
}

/// Per record, in order: recompute `record_hash`, check the link to the
/// previous record, then verify the signature. Finally the stored
/// `head_hash` must equal the last record's hash.
fn replay<'a>(
    count: usize,
    head: &str,
    records: impl Iterator<Item = Sealed<'a>>,
    keys: &dyn SignatureVerifier,
) -> VerificationResult {
    let mut expected_prev = Chain::GENESIS_HASH;
    let mut last_id = "";

    for (index, record) in records.enumerate() {
        let Sealed {
            record_id,
            digest,
            previous_record_hash,
            record_hash,
            signature,
            signing_key_id,
        } = record;
        let broken = |detail: &str| VerificationResult::broken(count, head, index, record_id, detail);

        let digest = match digest {
            Ok(d) => d,
            Err(_) => return broken(DETAIL_RECORD_HASH),
        };
        if hex::encode(digest) == record_hash {
            debug!(index, record_id, "record hash ok");
        } else {
            return broken(DETAIL_RECORD_HASH);
        }

        if previous_record_hash != expected_prev {
            return broken(DETAIL_PREVIOUS_HASH);
        }

        match keys.verify(signing_key_id, &digest, signature) {
            SignatureCheck::Valid => {}
            SignatureCheck::UnknownKey => return broken(DETAIL_UNKNOWN_KEY),
            SignatureCheck::Invalid => return broken(DETAIL_SIGNATURE),
        }

        expected_prev = record_hash;
        last_id = record_id;
    }

    if head != expected_prev {
        let index = count.saturating_sub(1);
        return VerificationResult::broken(count, head, index, last_id, DETAIL_HEAD_HASH);
    }

    VerificationResult::intact(count, head)
}

fn text_at<'v>(value: &'v Value, path: &[&str]) -> &'v str {
    path.iter()
        .try_fold(value, |current, key| current.get(*key))
        .and_then(Value::as_str)
        .unwrap_or_default()
}
