//! Canonical finding keys.
//!
//! Findings describing the same underlying condition share a key, even when
//! different detectors label them differently. The skill-policy check and
//! the skill-privilege scanner both report the same conflict, so every
//! `WRKR-014` finding and every `skill_policy_conflict` finding for one
//! repository collapses to `skill_policy_conflict:<org>:<repo>`.

use serde::Serialize;

use wrkr_contracts::finding::{
    Finding, FINDING_POLICY_CHECK, FINDING_POLICY_VIOLATION, FINDING_SKILL_POLICY_CONFLICT,
    RULE_SKILL_POLICY,
};
use wrkr_core::canonical::canonical_json_bytes;

/// Whether `finding` reports the skill-policy conflict condition.
pub fn is_skill_policy(finding: &Finding) -> bool {
    finding.rule_id == RULE_SKILL_POLICY || finding.finding_type == FINDING_SKILL_POLICY_CONFLICT
}

/// The grouping key of `finding`.
pub fn canonical_key(finding: &Finding) -> String {
    if is_skill_policy(finding) {
        return format!(
            "{FINDING_SKILL_POLICY_CONFLICT}:{}:{}",
            finding.org, finding.repo
        );
    }
    [
        finding.finding_type.as_str(),
        finding.rule_id.as_str(),
        finding.tool_type.as_str(),
        finding.location.as_str(),
        finding.repo.as_str(),
        finding.org.as_str(),
    ]
    .join("|")
}

/// Rank used to pick a group's representative; lower wins.
pub(crate) fn precedence(finding: &Finding) -> u8 {
    let skill_rule = finding.rule_id == RULE_SKILL_POLICY;
    match finding.finding_type.as_str() {
        FINDING_SKILL_POLICY_CONFLICT => 0,
        FINDING_POLICY_VIOLATION if skill_rule => 1,
        FINDING_POLICY_CHECK if skill_rule => 2,
        _ => 3,
    }
}

/// Total order over findings used for tie-breaking.
pub(crate) fn sort_key(finding: &Finding) -> [&str; 9] {
    [
        finding.finding_type.as_str(),
        finding.rule_id.as_str(),
        finding.tool_type.as_str(),
        finding.location.as_str(),
        finding.repo.as_str(),
        finding.org.as_str(),
        finding.severity.as_str(),
        finding.detector.as_str(),
        finding.message.as_str(),
    ]
}

/// Canonical encoding of `value`, the last tie-break between items that
/// agree on every ordered field.
///
/// Inputs are string-keyed maps of strings, numbers, and booleans, which
/// always encode; the empty fallback is unreachable.
pub(crate) fn tie_break<T: Serialize>(value: &T) -> Vec<u8> {
    canonical_json_bytes(value).unwrap_or_default()
}
