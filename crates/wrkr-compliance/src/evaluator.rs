//! Coverage evaluation.
//!
//! For each control (flattened, sorted by id):
//!
//! 1. Gather records whose `record_type` is one of the required types. A
//!    required type with no records is a missing type.
//! 2. A required field is satisfied when any gathered record has a
//!    non-empty value at that path.
//! 3. The control is `covered` when nothing is missing, else a `gap`.
//!
//! Field paths are dotted lookups into the serialized record
//! (`integrity.record_hash`, `event.finding_type`). A bare name that is not
//! a record attribute is also looked up under `event` and then `metadata`.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use wrkr_contracts::{
    compliance::{ComplianceResult, Control, ControlGap, ControlResult, ControlStatus, Framework},
    error::{WrkrError, WrkrResult},
    record::Chain,
};
use wrkr_proof::store::read_chain;

use crate::framework::{flatten_controls, load_framework};

/// Load both inputs and evaluate. The chain must already exist.
pub fn evaluate_files(framework_path: &Path, chain_path: &Path) -> WrkrResult<ComplianceResult> {
    let framework = load_framework(framework_path)?;
    if !chain_path.exists() {
        return Err(WrkrError::ChainNotFound {
            path: chain_path.display().to_string(),
        });
    }
    let chain = read_chain(chain_path)?;
    evaluate(&framework, &chain)
}

/// Evaluate `framework` against the records in `chain`.
pub fn evaluate(framework: &Framework, chain: &Chain) -> WrkrResult<ComplianceResult> {
    let documents = chain
        .records
        .iter()
        .map(|record| {
            let doc = serde_json::to_value(record).map_err(|e| WrkrError::Serialization {
                reason: e.to_string(),
            })?;
            Ok((record.record_type.as_str(), doc))
        })
        .collect::<WrkrResult<Vec<(&str, Value)>>>()?;

    let controls: Vec<ControlResult> = flatten_controls(framework)
        .into_iter()
        .map(|control| evaluate_control(control, &documents))
        .collect();

    let control_count = controls.len();
    let covered_count = controls
        .iter()
        .filter(|c| c.status == ControlStatus::Covered)
        .count();
    let gaps: Vec<ControlGap> = controls
        .iter()
        .filter(|c| c.status == ControlStatus::Gap)
        .map(|c| ControlGap {
            control_id: c.control_id.clone(),
            missing_record_types: c.missing_record_types.clone(),
            missing_fields: c.missing_fields.clone(),
        })
        .collect();
    let coverage_percent = coverage_percent(covered_count, control_count);

    info!(
        framework_id = %framework.framework_id,
        records = chain.records.len(),
        control_count,
        covered_count,
        coverage_percent,
        "compliance evaluated"
    );

    Ok(ComplianceResult {
        framework_id: framework.framework_id.clone(),
        version: framework.version.clone(),
        title: framework.title.clone(),
        control_count,
        covered_count,
        coverage_percent,
        controls,
        gaps,
    })
}

/// `covered / total × 100`, two decimals; 100 for an empty framework.
pub fn coverage_percent(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let percent = covered as f64 / total as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

fn evaluate_control(control: &Control, documents: &[(&str, Value)]) -> ControlResult {
    let mut matched: Vec<&Value> = Vec::new();
    let mut missing_record_types = Vec::new();
    for required in &control.required_record_types {
        let before = matched.len();
        matched.extend(
            documents
                .iter()
                .filter(|(record_type, _)| record_type == required)
                .map(|(_, doc)| doc),
        );
        if matched.len() == before {
            missing_record_types.push(required.clone());
        }
    }
    // A control that names no record types is checked against every record.
    if control.required_record_types.is_empty() {
        matched.extend(documents.iter().map(|(_, doc)| doc));
    }

    let missing_fields: Vec<String> = control
        .required_fields
        .iter()
        .filter(|field| !matched.iter().any(|doc| field_present(doc, field)))
        .cloned()
        .collect();

    let status = if missing_record_types.is_empty() && missing_fields.is_empty() {
        ControlStatus::Covered
    } else {
        ControlStatus::Gap
    };
    debug!(
        control_id = %control.id,
        matched = matched.len(),
        ?status,
        "control evaluated"
    );

    ControlResult {
        control_id: control.id.clone(),
        title: control.title.clone(),
        status,
        required_record_types: control.required_record_types.clone(),
        required_fields: control.required_fields.clone(),
        matched_record_count: matched.len(),
        missing_record_types,
        missing_fields,
    }
}

fn field_present(doc: &Value, field: &str) -> bool {
    if resolve_path(doc, field).is_some() {
        return true;
    }
    if field.contains('.') || doc.get(field).is_some() {
        return false;
    }
    ["event", "metadata"]
        .iter()
        .any(|section| resolve_path(doc, &format!("{section}.{field}")).is_some())
}

/// Walk a dot-separated path, treating null and empty values as absent.
fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = value;
    for segment in path.split('.') {
        match current.get(segment) {
            Some(v) if !v.is_null() => current = v,
            _ => return None,
        }
    }
    let empty = match current {
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    };
    (!empty).then_some(current)
}
