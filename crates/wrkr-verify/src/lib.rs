//! # wrkr-verify
//!
//! Tamper detection for Wrkr proof chains.
//!
//! [`engine::ChainVerifier`] loads a chain file, checks it against an
//! embedded JSON Schema, and replays every record's hash, link, and
//! signature. It reports the first broken record by index and id.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use wrkr_verify::ChainVerifier;
//!
//! let verifier = ChainVerifier::for_store(&layout, &KeyEnv::from_env())?;
//! let result = verifier.verify_path(&layout.chain_path())?;
//! if !result.intact {
//!     eprintln!("broken at {:?}: {:?}", result.break_index, result.detail);
//! }
//! ```

pub mod engine;
pub mod schema;

pub use engine::{load_checked, load_document, verify_chain, verify_document, ChainVerifier};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use wrkr_contracts::{
        error::WrkrError,
        record::{Chain, Controls, RecordDraft, RecordType},
        value::payload,
        verify::{REASON_INTEGRITY_FAILURE, REASON_OK},
    };
    use wrkr_core::{canonical, RecordBuilder, StoreLayout};
    use wrkr_proof::{KeyEnv, KeyRing, ProofStore, SigningKeyMaterial};

    use super::engine::*;
    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn draft(n: usize, product: &str) -> RecordDraft {
        RecordDraft {
            record_type: RecordType::ScanFinding,
            timestamp: Utc::now(),
            source: "wrkr".to_string(),
            source_product: product.to_string(),
            agent_id: Some(format!("wrkr:tool-{n}:acme")),
            event: payload([("finding_type", "mcp_server"), ("location", ".mcp.json")]),
            metadata: payload([("n", n)]),
            controls: Controls::default(),
        }
    }

    fn signed_chain(key: &SigningKeyMaterial, n: usize) -> Chain {
        let mut chain = Chain::new("wrkr-proof");
        RecordBuilder::new(key)
            .append_all(&mut chain, (0..n).map(|i| draft(i, "wrkr")))
            .unwrap();
        chain
    }

    /// A store holding `n` appended records.
    fn store_with(dir: &std::path::Path, n: usize) -> StoreLayout {
        let layout = StoreLayout::new(dir);
        let mut store = ProofStore::open(layout.clone(), "wrkr-proof", &KeyEnv::default()).unwrap();
        store.append((0..n).map(|i| draft(i, "wrkr")).collect()).unwrap();
        store.close().unwrap();
        layout
    }

    fn edit_chain_file(path: &std::path::Path, edit: impl FnOnce(&mut serde_json::Value)) {
        let mut doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        edit(&mut doc);
        std::fs::write(path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
    }

    fn ring(keys: &[&SigningKeyMaterial]) -> KeyRing {
        let mut ring = KeyRing::new();
        for key in keys {
            ring.insert(key.verifier_key());
        }
        ring
    }

    // ── Replay ────────────────────────────────────────────────────────────────

    #[test]
    fn test_appended_chain_is_intact() {
        let key = SigningKeyMaterial::generate();
        let chain = signed_chain(&key, 5);

        let result = verify_chain(&chain, &ring(&[&key]));
        assert!(result.intact);
        assert_eq!(result.count, 5);
        assert_eq!(result.reason, REASON_OK);
        assert_eq!(result.head_hash, chain.head_hash);
        assert!(result.break_index.is_none());
    }

    #[test]
    fn test_empty_chain_is_intact() {
        let result = verify_chain(&Chain::new("wrkr-proof"), &KeyRing::new());
        assert!(result.intact);
        assert_eq!(result.count, 0);
        assert_eq!(result.head_hash, Chain::GENESIS_HASH);
    }

    /// Changing one field of a historical record breaks at that record.
    #[test]
    fn test_mutation_breaks_at_index() {
        let key = SigningKeyMaterial::generate();
        let mut chain = signed_chain(&key, 4);
        chain.records[2]
            .event
            .insert("location".to_string(), "elsewhere.json".into());
        let tampered_id = chain.records[2].record_id.0.clone();

        let result = verify_chain(&chain, &ring(&[&key]));
        assert!(!result.intact);
        assert_eq!(result.reason, REASON_INTEGRITY_FAILURE);
        assert_eq!(result.break_index, Some(2));
        assert_eq!(result.break_point.as_deref(), Some(tampered_id.as_str()));
        assert_eq!(result.detail.as_deref(), Some(DETAIL_RECORD_HASH));
    }

    /// Re-hashing a tampered record without re-signing is still caught.
    #[test]
    fn test_rehashed_record_fails_signature() {
        let key = SigningKeyMaterial::generate();
        let mut chain = signed_chain(&key, 3);
        let record = &mut chain.records[0];
        record.controls.permissions_enforced = true;
        let rehashed = canonical::record_hash(record).unwrap();
        record.integrity.record_hash = rehashed;

        let result = verify_chain(&chain, &ring(&[&key]));
        assert_eq!(result.break_index, Some(0));
        assert_eq!(result.detail.as_deref(), Some(DETAIL_SIGNATURE));
    }

    #[test]
    fn test_reordered_records_break_linkage() {
        let key = SigningKeyMaterial::generate();
        let mut chain = signed_chain(&key, 3);
        chain.records.swap(1, 2);

        let result = verify_chain(&chain, &ring(&[&key]));
        assert_eq!(result.break_index, Some(1));
        assert_eq!(result.detail.as_deref(), Some(DETAIL_PREVIOUS_HASH));
    }

    #[test]
    fn test_head_hash_mismatch_is_reported() {
        let key = SigningKeyMaterial::generate();
        let mut chain = signed_chain(&key, 2);
        chain.head_hash = chain.records[0].integrity.record_hash.clone();

        let result = verify_chain(&chain, &ring(&[&key]));
        assert!(!result.intact);
        assert_eq!(result.break_index, Some(1));
        assert_eq!(result.detail.as_deref(), Some(DETAIL_HEAD_HASH));
    }

    /// Records from a cooperating product verify under its own key.
    #[test]
    fn test_mixed_source_chain() {
        let ours = SigningKeyMaterial::generate();
        let theirs = SigningKeyMaterial::generate();
        let mut chain = Chain::new("wrkr-proof");
        RecordBuilder::new(&ours).append(&mut chain, draft(0, "wrkr")).unwrap();
        RecordBuilder::new(&theirs).append(&mut chain, draft(1, "axym")).unwrap();
        RecordBuilder::new(&ours).append(&mut chain, draft(2, "wrkr")).unwrap();

        let both = verify_chain(&chain, &ring(&[&ours, &theirs]));
        assert!(both.intact, "{both:?}");
        assert_eq!(both.count, 3);

        let only_ours = verify_chain(&chain, &ring(&[&ours]));
        assert_eq!(only_ours.break_index, Some(1));
        assert_eq!(only_ours.detail.as_deref(), Some(DETAIL_UNKNOWN_KEY));
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_verify_store_chain_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        let mut store = ProofStore::open(layout.clone(), "wrkr-proof", &KeyEnv::default()).unwrap();
        store.append((0..3).map(|i| draft(i, "wrkr")).collect()).unwrap();
        store.close().unwrap();

        let verifier = ChainVerifier::for_store(&layout, &KeyEnv::default()).unwrap();
        let result = verifier.verify_path(&layout.chain_path()).unwrap();
        assert!(result.intact);
        assert_eq!(result.count, 3);
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_tampered_file_is_integrity_failure() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        let mut store = ProofStore::open(layout.clone(), "wrkr-proof", &KeyEnv::default()).unwrap();
        store.append((0..3).map(|i| draft(i, "wrkr")).collect()).unwrap();
        store.close().unwrap();

        let path = layout.chain_path();
        let mut doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        doc["records"][1]["event"]["finding_type"] = json!("ci_agent");
        std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();

        let verifier = ChainVerifier::for_store(&layout, &KeyEnv::default()).unwrap();
        let result = verifier.verify_path(&path).unwrap();
        assert_eq!(result.break_index, Some(1));

        let err = result.into_result().unwrap_err();
        assert!(matches!(err, WrkrError::IntegrityFailure { index: 1, .. }));
        assert_eq!(err.exit_code(), 6);
    }

    /// Members the record type does not declare are still covered by the hash.
    #[test]
    fn test_injected_members_break_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let layout = store_with(dir.path(), 2);
        let path = layout.chain_path();
        let verifier = ChainVerifier::for_store(&layout, &KeyEnv::default()).unwrap();

        edit_chain_file(&path, |doc| doc["records"][0]["approver"] = json!("mallory"));
        let result = verifier.verify_path(&path).unwrap();
        assert!(!result.intact);
        assert_eq!(result.break_index, Some(0));
        assert_eq!(result.detail.as_deref(), Some(DETAIL_RECORD_HASH));

        edit_chain_file(&path, |doc| {
            doc["records"][0].as_object_mut().unwrap().remove("approver");
            doc["records"][1]["controls"]["approved_by_override"] = json!("mallory");
        });
        let result = verifier.verify_path(&path).unwrap();
        assert_eq!(result.break_index, Some(1));
        assert_eq!(result.detail.as_deref(), Some(DETAIL_RECORD_HASH));
        assert_eq!(result.into_result().unwrap_err().exit_code(), 6);
    }

    /// A value the payload type cannot hold is tampering, not a parse error.
    #[test]
    fn test_undecodable_value_is_integrity_failure() {
        let dir = tempfile::tempdir().unwrap();
        let layout = store_with(dir.path(), 2);
        let path = layout.chain_path();
        edit_chain_file(&path, |doc| doc["records"][1]["event"]["approver"] = json!(null));

        let verifier = ChainVerifier::for_store(&layout, &KeyEnv::default()).unwrap();
        let result = verifier.verify_path(&path).unwrap();
        assert!(!result.intact);
        assert_eq!(result.break_index, Some(1));
        assert_eq!(result.detail.as_deref(), Some(DETAIL_RECORD_HASH));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = ChainVerifier::default()
            .verify_path(&dir.path().join("proof-chain.json"))
            .unwrap_err();
        assert!(matches!(err, WrkrError::ChainNotFound { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proof-chain.json");

        std::fs::write(&path, "{ \"chain_id\": ").unwrap();
        let err = load_checked(&path).unwrap_err();
        assert!(matches!(err, WrkrError::ChainParse { .. }));

        let no_integrity = json!({
            "chain_id": "wrkr-proof",
            "head_hash": Chain::GENESIS_HASH,
            "records": [{
                "record_id": "rec-1",
                "record_type": "scan_finding",
                "timestamp": "2026-01-01T00:00:00Z",
                "source": "wrkr",
                "source_product": "wrkr"
            }]
        });
        std::fs::write(&path, no_integrity.to_string()).unwrap();
        let err = load_checked(&path).unwrap_err();
        match err {
            WrkrError::ChainParse { reason, .. } => assert!(reason.contains("integrity"), "{reason}"),
            other => panic!("expected ChainParse, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_record_type_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proof-chain.json");
        let key = SigningKeyMaterial::generate();
        let mut doc = serde_json::to_value(signed_chain(&key, 1)).unwrap();
        doc["records"][0]["record_type"] = json!("audit_note");
        std::fs::write(&path, doc.to_string()).unwrap();

        let err = load_checked(&path).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }
}
