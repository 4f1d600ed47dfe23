//! # wrkr-compliance
//!
//! Compliance coverage for Wrkr proof chains.
//!
//! A framework is a tree of controls, each naming the record types and
//! fields the chain must contain. [`evaluator::evaluate`] checks every
//! control against the chain and reports coverage and gaps.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wrkr_compliance::evaluate_files;
//!
//! let result = evaluate_files(Path::new("frameworks/soc2.toml"), &layout.chain_path())?;
//! println!("{}% covered", result.coverage_percent);
//! ```

pub mod evaluator;
pub mod framework;

pub use evaluator::{coverage_percent, evaluate, evaluate_files};
pub use framework::{flatten_controls, load_framework};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use wrkr_contracts::{
        compliance::{ControlStatus, Framework},
        error::WrkrError,
        record::{Chain, Controls, RecordDraft, RecordType},
        value::payload,
    };
    use wrkr_core::{RecordBuilder, StoreLayout};
    use wrkr_proof::{KeyEnv, ProofStore, SigningKeyMaterial};

    use super::framework::{framework_from_json_str, framework_from_toml_str};
    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    const FRAMEWORK: &str = r#"
        framework_id = "wrkr-baseline"
        version = "1"
        title = "Wrkr baseline"

        [[controls]]
        id = "inventory"
        title = "Tool inventory"
        required_record_types = ["scan_finding"]
        required_fields = ["record_id", "integrity.record_hash", "finding_type"]

        [[controls]]
        id = "approval"
        title = "Approved scope"
        required_record_types = ["approval"]
        required_fields = ["controls.approved_scope"]
    "#;

    fn finding_draft() -> RecordDraft {
        RecordDraft {
            record_type: RecordType::ScanFinding,
            timestamp: Utc::now(),
            source: "wrkr".to_string(),
            source_product: "wrkr".to_string(),
            agent_id: None,
            event: payload([("finding_type", "mcp_server")]),
            metadata: payload([("canonical_key", "mcp_server|||.mcp.json|payments|acme")]),
            controls: Controls::default(),
        }
    }

    fn decision_draft(scope: Option<&str>) -> RecordDraft {
        RecordDraft {
            record_type: RecordType::Decision,
            agent_id: Some("wrkr:github-mcp:acme".to_string()),
            event: payload([("event_type", "lifecycle_transition")]),
            metadata: Default::default(),
            controls: Controls {
                permissions_enforced: true,
                approved_scope: scope.map(str::to_string),
                within_scope: scope.map(|_| true),
            },
            ..finding_draft()
        }
    }

    fn chain_of(drafts: Vec<RecordDraft>) -> Chain {
        let key = SigningKeyMaterial::generate();
        let mut chain = Chain::new("wrkr-proof");
        RecordBuilder::new(&key).append_all(&mut chain, drafts).unwrap();
        chain
    }

    // ── Coverage ──────────────────────────────────────────────────────────────

    /// Two controls, one without evidence: 50% and exactly one gap.
    #[test]
    fn test_half_coverage_reports_one_gap() {
        let framework = framework_from_toml_str(FRAMEWORK).unwrap();
        let chain = chain_of(vec![finding_draft(), decision_draft(None)]);

        let result = evaluate(&framework, &chain).unwrap();
        assert_eq!(result.control_count, 2);
        assert_eq!(result.covered_count, 1);
        assert_eq!(result.coverage_percent, 50.0);
        assert_eq!(result.gaps.len(), 1);
        assert_eq!(result.gaps[0].control_id, "approval");
        assert_eq!(result.gaps[0].missing_record_types, vec!["approval".to_string()]);

        let inventory = &result.controls[1];
        assert_eq!(inventory.control_id, "inventory");
        assert_eq!(inventory.status, ControlStatus::Covered);
        assert_eq!(inventory.matched_record_count, 1);
    }

    #[test]
    fn test_empty_framework_is_fully_covered() {
        let framework = Framework {
            framework_id: "empty".to_string(),
            version: String::new(),
            title: String::new(),
            controls: vec![],
        };
        let result = evaluate(&framework, &Chain::new("wrkr-proof")).unwrap();
        assert_eq!(result.control_count, 0);
        assert_eq!(result.coverage_percent, 100.0);
        assert!(result.gaps.is_empty());
    }

    #[test]
    fn test_coverage_rounds_to_two_decimals() {
        assert_eq!(coverage_percent(1, 3), 33.33);
        assert_eq!(coverage_percent(2, 3), 66.67);
        assert_eq!(coverage_percent(0, 4), 0.0);
    }

    /// Nested controls are flattened and sorted by id.
    #[test]
    fn test_nested_controls_are_flattened() {
        let framework = framework_from_json_str(
            r#"{
                "framework_id": "nested",
                "controls": [
                    {"id": "b", "required_record_types": ["decision"],
                     "controls": [{"id": "a.1", "required_fields": ["event.event_type"]}]},
                    {"id": "a", "required_record_types": ["risk_assessment"]}
                ]
            }"#,
        )
        .unwrap();
        let ids: Vec<_> = flatten_controls(&framework).into_iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "a.1", "b"]);

        let chain = chain_of(vec![decision_draft(None)]);
        let result = evaluate(&framework, &chain).unwrap();
        let statuses: Vec<_> = result.controls.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            [ControlStatus::Gap, ControlStatus::Covered, ControlStatus::Covered]
        );
        assert_eq!(result.coverage_percent, 66.67);
    }

    /// Fields only count on records of a required type.
    #[test]
    fn test_scope_field_needs_matching_record_type() {
        let framework = framework_from_toml_str(
            r#"
            framework_id = "scope"
            [[controls]]
            id = "scoped"
            required_record_types = ["decision"]
            required_fields = ["controls.approved_scope", "canonical_key"]
            "#,
        )
        .unwrap();

        let unscoped = evaluate(&framework, &chain_of(vec![decision_draft(None)])).unwrap();
        assert_eq!(
            unscoped.controls[0].missing_fields,
            vec!["controls.approved_scope".to_string(), "canonical_key".to_string()]
        );

        let scoped = chain_of(vec![decision_draft(Some("read-only")), finding_draft()]);
        let result = evaluate(&framework, &scoped).unwrap();
        assert_eq!(
            result.controls[0].missing_fields,
            vec!["canonical_key".to_string()],
            "metadata on a scan_finding must not satisfy a decision control"
        );
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_evaluate_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path().join(".wrkr"));
        let framework_path = dir.path().join("baseline.toml");
        std::fs::write(&framework_path, FRAMEWORK).unwrap();

        let err = evaluate_files(&framework_path, &layout.chain_path()).unwrap_err();
        assert!(matches!(err, WrkrError::ChainNotFound { .. }));

        let mut store = ProofStore::open(layout.clone(), "wrkr-proof", &KeyEnv::default()).unwrap();
        store.append(vec![finding_draft()]).unwrap();
        store.close().unwrap();

        let result = evaluate_files(&framework_path, &layout.chain_path()).unwrap();
        assert_eq!(result.framework_id, "wrkr-baseline");
        assert_eq!(result.covered_count, 1);
    }

    #[test]
    fn test_framework_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_framework(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, WrkrError::MissingInput { .. }));
        assert_eq!(err.exit_code(), 2);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{\"controls\": []}").unwrap();
        match load_framework(&bad).unwrap_err() {
            WrkrError::ChainParse { path, .. } => assert!(path.ends_with("bad.json")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
