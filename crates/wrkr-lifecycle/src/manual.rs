//! Operator-driven lifecycle transitions.

use chrono::{DateTime, Utc};
use tracing::info;

use wrkr_contracts::{
    error::{WrkrError, WrkrResult},
    identity::{Approval, ApprovalState, IdentityManifest, LifecycleState, Transition, TransitionTrigger},
    value::Payload,
};

use crate::state::{normalize, record_state_changes};

/// An operator's request to move one identity to a new state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualTransition {
    pub agent_id: String,
    /// One of the six lifecycle state names; parsed case-insensitively.
    pub new_state: String,
    pub approver: String,
    pub scope: String,
    pub reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Apply `request` to `manifest` and return the resulting transition.
///
/// Validation happens before anything is touched: on error the manifest is
/// unchanged.
pub fn apply_manual_state(
    manifest: &mut IdentityManifest,
    request: &ManualTransition,
    now: DateTime<Utc>,
) -> WrkrResult<Transition> {
    let state: LifecycleState = request.new_state.parse()?;
    let approving = matches!(state, LifecycleState::Approved | LifecycleState::Active);
    if approving && request.approver.trim().is_empty() {
        return Err(WrkrError::MissingInput {
            reason: format!("approving '{}' requires an approver", request.agent_id),
        });
    }
    let identity = manifest
        .get_mut(&request.agent_id)
        .ok_or_else(|| WrkrError::AgentNotFound {
            agent_id: request.agent_id.clone(),
        })?;

    let before = identity.clone();
    let supplied_reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    match state {
        LifecycleState::Approved | LifecycleState::Active => {
            identity.approval = Approval {
                approver: request.approver.clone(),
                scope: request.scope.clone(),
                approved_at: Some(now),
                expires_at: request.expires_at,
            };
            identity.approval_state = ApprovalState::Valid;
        }
        LifecycleState::Revoked | LifecycleState::Deprecated | LifecycleState::UnderReview => {
            if supplied_reason.is_some() {
                identity.approval_state = ApprovalState::Revoked;
            }
        }
        LifecycleState::Discovered => {}
    }
    identity.status = state;
    normalize(identity);

    let reason = supplied_reason
        .map(str::to_string)
        .unwrap_or_else(|| format!("manual_transition_{state}"));

    let mut diff = Payload::new();
    record_state_changes(&mut diff, &before, identity);
    diff.insert("reason".to_string(), reason.as_str().into());
    if !request.approver.is_empty() {
        diff.insert("approver".to_string(), request.approver.as_str().into());
    }
    if !request.scope.is_empty() {
        diff.insert("scope".to_string(), request.scope.as_str().into());
    }
    if let Some(expires_at) = request.expires_at {
        diff.insert("expires_at".to_string(), expires_at.to_rfc3339().into());
    }

    let transition = Transition {
        agent_id: identity.agent_id.clone(),
        previous_state: Some(before.status),
        new_state: identity.status,
        trigger: TransitionTrigger::ManualTransition,
        diff,
        timestamp: now,
    };
    manifest.updated_at = now;

    info!(
        agent_id = %transition.agent_id,
        from = %before.status,
        to = %transition.new_state,
        reason = %reason,
        "manual lifecycle transition"
    );
    Ok(transition)
}
