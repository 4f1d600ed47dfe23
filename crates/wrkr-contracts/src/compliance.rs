//! Compliance framework definitions and coverage results.
//!
//! A framework is a tree of controls. Each control names the record types
//! and fields the proof chain must contain for the control to be covered.

use serde::{Deserialize, Serialize};

/// An externally supplied control catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Framework {
    pub framework_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub controls: Vec<Control>,
}

/// One control, possibly with nested child controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub required_record_types: Vec<String>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub controls: Vec<Control>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    Covered,
    Gap,
}

/// Evaluation outcome for a single control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResult {
    pub control_id: String,
    pub title: String,
    pub status: ControlStatus,
    pub required_record_types: Vec<String>,
    pub required_fields: Vec<String>,
    pub matched_record_count: usize,
    pub missing_record_types: Vec<String>,
    pub missing_fields: Vec<String>,
}

/// What a control is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlGap {
    pub control_id: String,
    pub missing_record_types: Vec<String>,
    pub missing_fields: Vec<String>,
}

/// Coverage of one framework by one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub framework_id: String,
    pub version: String,
    pub title: String,
    pub control_count: usize,
    pub covered_count: usize,
    pub coverage_percent: f64,
    pub controls: Vec<ControlResult>,
    pub gaps: Vec<ControlGap>,
}
