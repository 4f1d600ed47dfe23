//! Detector findings and risk reports consumed by the canonical mapper.
//!
//! Both shapes come from collaborators outside this workspace (detectors
//! and the risk scorer); they are read from JSON and never produced here.

use serde::{Deserialize, Serialize};

use crate::value::Payload;

/// Rule id shared by the policy engine's skill-policy check and violation.
pub const RULE_SKILL_POLICY: &str = "WRKR-014";

pub const FINDING_SKILL_POLICY_CONFLICT: &str = "skill_policy_conflict";
pub const FINDING_POLICY_VIOLATION: &str = "policy_violation";
pub const FINDING_POLICY_CHECK: &str = "policy_check";

/// One raw detector finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub finding_type: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub rule_id: String,
    #[serde(default)]
    pub tool_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub org: String,
    /// Which detector or engine emitted the finding.
    #[serde(default)]
    pub detector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub evidence: Payload,
}

/// One scored finding from the risk report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRisk {
    pub finding_key: String,
    #[serde(default)]
    pub finding_type: String,
    #[serde(default)]
    pub rule_id: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    pub score: f64,
    #[serde(default)]
    pub blast_radius: f64,
    #[serde(default)]
    pub privilege: String,
    #[serde(default)]
    pub trust_deficit: f64,
    #[serde(default)]
    pub data_class: String,
    #[serde(default)]
    pub endpoint_class: String,
    #[serde(default)]
    pub autonomy_level: String,
}

/// Aggregate posture for one governance cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostureScore {
    pub score: f64,
    #[serde(default)]
    pub grade: String,
    #[serde(default)]
    pub total_tools: u64,
    #[serde(default)]
    pub total_findings: u64,
    #[serde(default)]
    pub weights: Payload,
}

/// Output of the risk scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    #[serde(default)]
    pub ranked: Vec<RankedRisk>,
    #[serde(default)]
    pub posture: PostureScore,
}
