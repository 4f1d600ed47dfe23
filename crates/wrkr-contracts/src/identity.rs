//! Governed identities, lifecycle states, and transitions.
//!
//! An `IdentityRecord` tracks one discovered tool or agent across scans.
//! Its `status` moves through a six-state lifecycle; every change is
//! described by a `Transition` that ends up on the proof chain.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::WrkrError,
    value::Payload,
};

/// Derive the stable agent id for a tool within an organisation.
pub fn agent_id(tool_id: &str, org: &str) -> String {
    format!("wrkr:{tool_id}:{org}")
}

/// Governance status of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Discovered,
    UnderReview,
    Approved,
    Active,
    Deprecated,
    Revoked,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 6] = [
        LifecycleState::Discovered,
        LifecycleState::UnderReview,
        LifecycleState::Approved,
        LifecycleState::Active,
        LifecycleState::Deprecated,
        LifecycleState::Revoked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Discovered => "discovered",
            LifecycleState::UnderReview => "under_review",
            LifecycleState::Approved => "approved",
            LifecycleState::Active => "active",
            LifecycleState::Deprecated => "deprecated",
            LifecycleState::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = WrkrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        LifecycleState::ALL
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| WrkrError::InvalidState {
                state: s.to_string(),
            })
    }
}

/// Validity of an identity's approval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    #[default]
    Missing,
    Valid,
    Expired,
    Invalid,
    Revoked,
}

impl ApprovalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalState::Missing => "missing",
            ApprovalState::Valid => "valid",
            ApprovalState::Expired => "expired",
            ApprovalState::Invalid => "invalid",
            ApprovalState::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who approved an identity, for what scope, and until when.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    #[serde(default)]
    pub approver: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A tool as reported by a detector during one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedTool {
    pub tool_id: String,
    pub tool_type: String,
    pub org: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub data_class: String,
    #[serde(default)]
    pub endpoint_class: String,
    #[serde(default)]
    pub autonomy_level: String,
    #[serde(default)]
    pub risk_score: f64,
}

impl ObservedTool {
    pub fn agent_id(&self) -> String {
        agent_id(&self.tool_id, &self.org)
    }
}

/// One governed tool/agent in the identity manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub agent_id: String,
    pub tool_id: String,
    pub tool_type: String,
    pub org: String,
    pub repo: String,
    pub location: String,
    pub status: LifecycleState,
    #[serde(default)]
    pub approval: Approval,
    #[serde(default)]
    pub approval_state: ApprovalState,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub present: bool,
    #[serde(default)]
    pub data_class: String,
    #[serde(default)]
    pub endpoint_class: String,
    #[serde(default)]
    pub autonomy_level: String,
    #[serde(default)]
    pub risk_score: f64,
}

impl IdentityRecord {
    /// A freshly discovered identity for a tool seen for the first time.
    pub fn discovered(tool: &ObservedTool, now: DateTime<Utc>) -> Self {
        Self {
            agent_id: tool.agent_id(),
            tool_id: tool.tool_id.clone(),
            tool_type: tool.tool_type.clone(),
            org: tool.org.clone(),
            repo: tool.repo.clone(),
            location: tool.location.clone(),
            status: LifecycleState::Discovered,
            approval: Approval::default(),
            approval_state: ApprovalState::Missing,
            first_seen: now,
            last_seen: now,
            present: true,
            data_class: tool.data_class.clone(),
            endpoint_class: tool.endpoint_class.clone(),
            autonomy_level: tool.autonomy_level.clone(),
            risk_score: tool.risk_score,
        }
    }
}

/// The persisted set of governed identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityManifest {
    pub version: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub identities: Vec<IdentityRecord>,
}

impl IdentityManifest {
    pub const VERSION: &'static str = "v1";

    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            version: Self::VERSION.to_string(),
            updated_at,
            identities: Vec::new(),
        }
    }

    pub fn get(&self, agent_id: &str) -> Option<&IdentityRecord> {
        self.identities.iter().find(|i| i.agent_id == agent_id)
    }

    pub fn get_mut(&mut self, agent_id: &str) -> Option<&mut IdentityRecord> {
        self.identities.iter_mut().find(|i| i.agent_id == agent_id)
    }
}

/// What caused a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionTrigger {
    FirstSeen,
    Reappeared,
    Modified,
    StateChanged,
    ManualTransition,
    Removed,
}

impl TransitionTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionTrigger::FirstSeen => "first_seen",
            TransitionTrigger::Reappeared => "reappeared",
            TransitionTrigger::Modified => "modified",
            TransitionTrigger::StateChanged => "state_changed",
            TransitionTrigger::ManualTransition => "manual_transition",
            TransitionTrigger::Removed => "removed",
        }
    }
}

impl std::fmt::Display for TransitionTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle change, created once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub agent_id: String,
    /// Absent for `first_seen`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<LifecycleState>,
    pub new_state: LifecycleState,
    pub trigger: TransitionTrigger,
    #[serde(default)]
    pub diff: Payload,
    pub timestamp: DateTime<Utc>,
}

impl Transition {
    pub const EVENT_APPROVAL: &'static str = "approval";
    pub const EVENT_LIFECYCLE: &'static str = "lifecycle_transition";

    /// `approval` for operator approvals, `lifecycle_transition` otherwise.
    pub fn event_type(&self) -> &'static str {
        let approving = matches!(
            self.new_state,
            LifecycleState::Approved | LifecycleState::Active
        );
        if self.trigger == TransitionTrigger::ManualTransition && approving {
            Self::EVENT_APPROVAL
        } else {
            Self::EVENT_LIFECYCLE
        }
    }

    /// The approval scope recorded in the diff, if any.
    pub fn scope(&self) -> Option<&str> {
        self.diff
            .get("scope")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}
