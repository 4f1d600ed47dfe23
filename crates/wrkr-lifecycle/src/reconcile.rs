//! Reconciliation of the identity manifest against a fresh observation set.
//!
//! One pass, per agent id in sorted order:
//!
//! - not in the manifest: new `discovered` identity, trigger `first_seen`
//! - previously absent: trigger `reappeared`
//! - classification changed: trigger `modified`, diff holds `{old, new}`
//! - no longer observed: carried forward with `present = false`, trigger
//!   `removed` on the first pass it goes missing
//!
//! Approval expiry and status normalization run for every identity. A
//! status change that no other trigger explains is recorded as
//! `state_changed`, so a pass never changes governance state silently.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use wrkr_contracts::{
    identity::{IdentityManifest, IdentityRecord, ObservedTool, Transition, TransitionTrigger},
    value::{Payload, Value},
};

use crate::state::{apply_expiry, normalize, record_state_changes};

/// The outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Next manifest, identities sorted by agent id.
    pub manifest: IdentityManifest,
    /// Transitions in agent id order.
    pub transitions: Vec<Transition>,
}

/// Compute the next manifest and the transitions that lead to it.
pub fn reconcile(
    previous: &IdentityManifest,
    observed: &[ObservedTool],
    now: DateTime<Utc>,
) -> Reconciliation {
    let prior: BTreeMap<&str, &IdentityRecord> = previous
        .identities
        .iter()
        .map(|identity| (identity.agent_id.as_str(), identity))
        .collect();

    let mut sorted: Vec<&ObservedTool> = observed.iter().collect();
    sorted.sort_by(|a, b| {
        (a.agent_id(), &a.repo, &a.location).cmp(&(b.agent_id(), &b.repo, &b.location))
    });
    let mut current: BTreeMap<String, &ObservedTool> = BTreeMap::new();
    for tool in sorted {
        let id = tool.agent_id();
        if current.contains_key(&id) {
            debug!(agent_id = %id, repo = %tool.repo, location = %tool.location, "duplicate observation ignored");
            continue;
        }
        current.insert(id, tool);
    }

    let agent_ids: BTreeSet<&str> = prior
        .keys()
        .copied()
        .chain(current.keys().map(String::as_str))
        .collect();

    let mut identities = Vec::with_capacity(agent_ids.len());
    let mut transitions = Vec::new();
    for agent_id in agent_ids {
        let (identity, transition) = match (prior.get(agent_id), current.get(agent_id)) {
            (None, Some(tool)) => first_seen(tool, now),
            (Some(before), Some(tool)) => observed_again(before, tool, now),
            (Some(before), None) => not_observed(before, now),
            (None, None) => continue,
        };
        if let Some(transition) = transition {
            debug!(
                agent_id = %transition.agent_id,
                trigger = %transition.trigger,
                new_state = %transition.new_state,
                "lifecycle transition"
            );
            transitions.push(transition);
        }
        identities.push(identity);
    }

    info!(
        identities = identities.len(),
        observed = current.len(),
        transitions = transitions.len(),
        "reconciliation complete"
    );

    Reconciliation {
        manifest: IdentityManifest {
            version: IdentityManifest::VERSION.to_string(),
            updated_at: now,
            identities,
        },
        transitions,
    }
}

fn first_seen(tool: &ObservedTool, now: DateTime<Utc>) -> (IdentityRecord, Option<Transition>) {
    let identity = IdentityRecord::discovered(tool, now);
    let mut diff = Payload::new();
    diff.insert("status".to_string(), identity.status.as_str().into());
    diff.insert("tool_type".to_string(), identity.tool_type.as_str().into());
    diff.insert("location".to_string(), identity.location.as_str().into());
    let transition = Transition {
        agent_id: identity.agent_id.clone(),
        previous_state: None,
        new_state: identity.status,
        trigger: TransitionTrigger::FirstSeen,
        diff,
        timestamp: now,
    };
    (identity, Some(transition))
}

fn observed_again(
    before: &IdentityRecord,
    tool: &ObservedTool,
    now: DateTime<Utc>,
) -> (IdentityRecord, Option<Transition>) {
    let mut trigger = None;
    let mut diff = Payload::new();

    if !before.present {
        trigger = Some(TransitionTrigger::Reappeared);
        diff.insert("present".to_string(), Value::change(false, true));
    }

    let classification = [
        ("data_class", &before.data_class, &tool.data_class),
        ("endpoint_class", &before.endpoint_class, &tool.endpoint_class),
        ("autonomy_level", &before.autonomy_level, &tool.autonomy_level),
    ];
    for (field, old, new) in classification {
        if old != new {
            diff.insert(field.to_string(), Value::change(old, new));
        }
    }
    if trigger.is_none() && !diff.is_empty() {
        trigger = Some(TransitionTrigger::Modified);
    }

    let mut identity = before.clone();
    identity.tool_type = tool.tool_type.clone();
    identity.repo = tool.repo.clone();
    identity.location = tool.location.clone();
    identity.data_class = tool.data_class.clone();
    identity.endpoint_class = tool.endpoint_class.clone();
    identity.autonomy_level = tool.autonomy_level.clone();
    identity.risk_score = tool.risk_score;
    identity.last_seen = now;
    identity.present = true;

    settle(before, identity, trigger, diff, now)
}

fn not_observed(before: &IdentityRecord, now: DateTime<Utc>) -> (IdentityRecord, Option<Transition>) {
    let mut identity = before.clone();
    let mut trigger = None;
    let mut diff = Payload::new();
    if before.present {
        identity.present = false;
        trigger = Some(TransitionTrigger::Removed);
        diff.insert("present".to_string(), Value::change(true, false));
    }
    settle(before, identity, trigger, diff, now)
}

/// Apply expiry and normalization, then decide whether a transition is due.
fn settle(
    before: &IdentityRecord,
    mut identity: IdentityRecord,
    mut trigger: Option<TransitionTrigger>,
    mut diff: Payload,
    now: DateTime<Utc>,
) -> (IdentityRecord, Option<Transition>) {
    if apply_expiry(&mut identity, now) {
        debug!(agent_id = %identity.agent_id, "approval expired");
    }
    normalize(&mut identity);
    record_state_changes(&mut diff, before, &identity);

    if trigger.is_none() && identity.status != before.status {
        trigger = Some(TransitionTrigger::StateChanged);
    }

    let transition = trigger.map(|trigger| Transition {
        agent_id: identity.agent_id.clone(),
        previous_state: Some(before.status),
        new_state: identity.status,
        trigger,
        diff,
        timestamp: now,
    });
    (identity, transition)
}
