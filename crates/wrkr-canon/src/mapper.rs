//! The canonical record mapper.
//!
//! Turns one governance cycle's inputs into record drafts:
//!
//! | Input        | Records                                              |
//! |--------------|------------------------------------------------------|
//! | findings     | one `scan_finding` per canonical key                 |
//! | risk report  | one `risk_assessment` per ranked finding + posture   |
//! | transitions  | one `decision`, or `approval` for operator approvals |
//!
//! Output depends only on the input set, never on its iteration order.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use wrkr_contracts::{
    finding::{Finding, RankedRisk, RiskReport},
    identity::Transition,
    record::{Controls, RecordDraft, RecordType},
    value::{Payload, Value},
};

use crate::{findings::group_findings, key::tie_break};

/// `event.assessment` of a per-finding risk record.
pub const ASSESSMENT_RANKED: &str = "ranked_finding";
/// `event.assessment` of the cycle's posture record.
pub const ASSESSMENT_POSTURE: &str = "posture_score";

/// Maps findings, risk, and transitions to record drafts.
#[derive(Debug, Clone)]
pub struct CanonicalMapper {
    source: String,
    source_product: String,
}

impl CanonicalMapper {
    pub fn new(source: impl Into<String>, source_product: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_product: source_product.into(),
        }
    }

    /// All drafts for one cycle: findings, then risk, then transitions.
    pub fn map_cycle(
        &self,
        findings: &[Finding],
        risk: Option<&RiskReport>,
        transitions: &[Transition],
        now: DateTime<Utc>,
    ) -> Vec<RecordDraft> {
        let mut drafts = self.map_findings(findings, now);
        if let Some(report) = risk {
            drafts.extend(self.map_risk(report, now));
        }
        drafts.extend(self.map_transitions(transitions));
        info!(
            findings = findings.len(),
            transitions = transitions.len(),
            drafts = drafts.len(),
            "cycle mapped"
        );
        drafts
    }

    /// One `scan_finding` draft per canonical key, in key order.
    pub fn map_findings(&self, findings: &[Finding], now: DateTime<Utc>) -> Vec<RecordDraft> {
        group_findings(findings)
            .into_iter()
            .map(|group| {
                let rep = group.representative;
                if group.members.len() > 1 {
                    debug!(
                        canonical_key = %group.key,
                        merged = group.members.len(),
                        representative = %rep.finding_type,
                        "findings merged"
                    );
                }

                let mut event = Payload::new();
                put(&mut event, "finding_type", &rep.finding_type);
                put(&mut event, "severity", &rep.severity);
                put(&mut event, "rule_id", &rep.rule_id);
                put(&mut event, "tool_type", &rep.tool_type);
                put(&mut event, "location", &rep.location);
                put(&mut event, "repo", &rep.repo);
                put(&mut event, "org", &rep.org);
                put(&mut event, "detector", &rep.detector);
                put(&mut event, "message", &rep.message);
                if !rep.evidence.is_empty() {
                    event.insert("evidence".to_string(), rep.evidence.clone().into());
                }

                let mut metadata = Payload::new();
                metadata.insert("canonical_key".to_string(), group.key.as_str().into());
                metadata.insert("merged_finding_count".to_string(), group.members.len().into());
                metadata.insert(
                    "linked_rule_ids".to_string(),
                    group.linked(|f| f.rule_id.as_str()).into(),
                );
                metadata.insert(
                    "linked_finding_types".to_string(),
                    group.linked(|f| f.finding_type.as_str()).into(),
                );
                metadata.insert(
                    "detectors".to_string(),
                    group.linked(|f| f.detector.as_str()).into(),
                );

                let agent_id = rep
                    .agent_id
                    .clone()
                    .or_else(|| group.members.iter().find_map(|f| f.agent_id.clone()));

                self.draft(
                    RecordType::ScanFinding,
                    now,
                    agent_id,
                    event,
                    metadata,
                    Controls::default(),
                )
            })
            .collect()
    }

    /// Ranked findings by score (descending) then finding key, plus posture.
    ///
    /// Risks equal on both are ordered by their canonical encoding.
    pub fn map_risk(&self, report: &RiskReport, now: DateTime<Utc>) -> Vec<RecordDraft> {
        let mut ranked: Vec<(&RankedRisk, Vec<u8>)> =
            report.ranked.iter().map(|r| (r, tie_break(r))).collect();
        ranked.sort_by(|(a, a_bytes), (b, b_bytes)| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.finding_key.cmp(&b.finding_key))
                .then_with(|| a_bytes.cmp(b_bytes))
        });

        let mut drafts: Vec<RecordDraft> = ranked
            .into_iter()
            .enumerate()
            .map(|(index, (risk, _))| {
                let mut event = Payload::new();
                event.insert("assessment".to_string(), ASSESSMENT_RANKED.into());
                event.insert("rank".to_string(), (index + 1).into());
                event.insert("finding_key".to_string(), risk.finding_key.as_str().into());
                put(&mut event, "finding_type", &risk.finding_type);
                put(&mut event, "rule_id", &risk.rule_id);
                put(&mut event, "org", &risk.org);
                put(&mut event, "repo", &risk.repo);
                put(&mut event, "location", &risk.location);
                event.insert("score".to_string(), risk.score.into());
                event.insert("blast_radius".to_string(), risk.blast_radius.into());
                put(&mut event, "privilege", &risk.privilege);
                event.insert("trust_deficit".to_string(), risk.trust_deficit.into());
                put(&mut event, "data_class", &risk.data_class);
                put(&mut event, "endpoint_class", &risk.endpoint_class);
                put(&mut event, "autonomy_level", &risk.autonomy_level);

                let mut metadata = Payload::new();
                metadata.insert("finding_key".to_string(), risk.finding_key.as_str().into());

                self.draft(
                    RecordType::RiskAssessment,
                    now,
                    risk.agent_id.clone(),
                    event,
                    metadata,
                    Controls::default(),
                )
            })
            .collect();

        let posture = &report.posture;
        let mut event = Payload::new();
        event.insert("assessment".to_string(), ASSESSMENT_POSTURE.into());
        event.insert("score".to_string(), posture.score.into());
        put(&mut event, "grade", &posture.grade);
        event.insert("total_tools".to_string(), posture.total_tools.into());
        event.insert("total_findings".to_string(), posture.total_findings.into());
        if !posture.weights.is_empty() {
            event.insert("weights".to_string(), posture.weights.clone().into());
        }
        let mut metadata = Payload::new();
        metadata.insert("ranked_count".to_string(), report.ranked.len().into());
        drafts.push(self.draft(
            RecordType::RiskAssessment,
            now,
            None,
            event,
            metadata,
            Controls::default(),
        ));
        drafts
    }

    /// One `decision` or `approval` draft per transition, ordered by agent id,
    /// timestamp, trigger, then canonical encoding.
    pub fn map_transitions(&self, transitions: &[Transition]) -> Vec<RecordDraft> {
        let mut ordered: Vec<(&Transition, Vec<u8>)> =
            transitions.iter().map(|t| (t, tie_break(t))).collect();
        ordered.sort_by(|(a, a_bytes), (b, b_bytes)| {
            (&a.agent_id, a.timestamp, a.trigger)
                .cmp(&(&b.agent_id, b.timestamp, b.trigger))
                .then_with(|| a_bytes.cmp(b_bytes))
        });

        ordered
            .into_iter()
            .map(|(transition, _)| {
                let event_type = transition.event_type();
                let record_type = if event_type == Transition::EVENT_APPROVAL {
                    RecordType::Approval
                } else {
                    RecordType::Decision
                };

                let mut event = Payload::new();
                event.insert("event_type".to_string(), event_type.into());
                event.insert("trigger".to_string(), transition.trigger.as_str().into());
                if let Some(previous) = transition.previous_state {
                    event.insert("previous_state".to_string(), previous.as_str().into());
                }
                event.insert("new_state".to_string(), transition.new_state.as_str().into());
                if !transition.diff.is_empty() {
                    event.insert("diff".to_string(), transition.diff.clone().into());
                }

                let mut controls = Controls {
                    permissions_enforced: true,
                    ..Controls::default()
                };
                if let Some(scope) = transition.scope() {
                    controls.approved_scope = Some(scope.to_string());
                    controls.within_scope = Some(true);
                }

                self.draft(
                    record_type,
                    transition.timestamp,
                    Some(transition.agent_id.clone()),
                    event,
                    Payload::new(),
                    controls,
                )
            })
            .collect()
    }

    fn draft(
        &self,
        record_type: RecordType,
        timestamp: DateTime<Utc>,
        agent_id: Option<String>,
        event: Payload,
        metadata: Payload,
        controls: Controls,
    ) -> RecordDraft {
        RecordDraft {
            record_type,
            timestamp,
            source: self.source.clone(),
            source_product: self.source_product.clone(),
            agent_id,
            event,
            metadata,
            controls,
        }
    }
}

fn put(payload: &mut Payload, key: &str, value: &str) {
    if !value.is_empty() {
        payload.insert(key.to_string(), Value::from(value));
    }
}
