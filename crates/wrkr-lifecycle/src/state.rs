//! Approval expiry and status normalization rules.
//!
//! ```text
//!  discovered ──► under_review ──► approved ──► active
//!                      ▲                           │
//!                      └──── approval expires ─────┘
//!
//!  deprecated / revoked: reachable from any state by operator action
//! ```

use chrono::{DateTime, Utc};

use wrkr_contracts::{
    identity::{ApprovalState, IdentityRecord, LifecycleState},
    value::{Payload, Value},
};

/// Mark a valid approval whose `expires_at` has passed as expired.
///
/// An `active` or `approved` identity drops back to `under_review`.
/// Returns whether the approval expired in this call.
pub fn apply_expiry(identity: &mut IdentityRecord, now: DateTime<Utc>) -> bool {
    let passed = identity
        .approval
        .expires_at
        .is_some_and(|expires_at| expires_at <= now);
    if identity.approval_state != ApprovalState::Valid || !passed {
        return false;
    }
    identity.approval_state = ApprovalState::Expired;
    if matches!(
        identity.status,
        LifecycleState::Active | LifecycleState::Approved
    ) {
        identity.status = LifecycleState::UnderReview;
    }
    true
}

/// Bring `status` in line with `approval_state`.
pub fn normalize(identity: &mut IdentityRecord) {
    identity.status = match (identity.status, identity.approval_state) {
        (LifecycleState::Approved, ApprovalState::Valid) => LifecycleState::Active,
        (LifecycleState::Active, state) if state != ApprovalState::Valid => {
            LifecycleState::UnderReview
        }
        (
            LifecycleState::Discovered,
            ApprovalState::Expired | ApprovalState::Invalid | ApprovalState::Revoked,
        ) => LifecycleState::UnderReview,
        (status, _) => status,
    };
}

/// Record `status` and `approval_state` changes between `before` and `after`.
pub(crate) fn record_state_changes(diff: &mut Payload, before: &IdentityRecord, after: &IdentityRecord) {
    if before.status != after.status {
        diff.insert(
            "status".to_string(),
            Value::change(before.status.as_str(), after.status.as_str()),
        );
    }
    if before.approval_state != after.approval_state {
        diff.insert(
            "approval_state".to_string(),
            Value::change(before.approval_state.as_str(), after.approval_state.as_str()),
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use wrkr_contracts::identity::{Approval, ObservedTool};

    use super::*;

    fn identity(status: LifecycleState, approval_state: ApprovalState) -> IdentityRecord {
        let tool = ObservedTool {
            tool_id: "cursor".to_string(),
            tool_type: "assistant".to_string(),
            org: "acme".to_string(),
            repo: "api".to_string(),
            location: ".cursor/rules".to_string(),
            data_class: String::new(),
            endpoint_class: String::new(),
            autonomy_level: String::new(),
            risk_score: 0.0,
        };
        let mut record = IdentityRecord::discovered(&tool, Utc::now());
        record.status = status;
        record.approval_state = approval_state;
        record
    }

    #[test]
    fn test_expiry_only_converts_valid_approvals() {
        let now = Utc::now();
        let mut active = identity(LifecycleState::Active, ApprovalState::Valid);
        active.approval = Approval {
            expires_at: Some(now - Duration::seconds(1)),
            ..Approval::default()
        };
        assert!(apply_expiry(&mut active, now));
        assert_eq!(active.status, LifecycleState::UnderReview);
        assert_eq!(active.approval_state, ApprovalState::Expired);

        let mut revoked = identity(LifecycleState::Revoked, ApprovalState::Revoked);
        revoked.approval.expires_at = Some(now - Duration::days(1));
        assert!(!apply_expiry(&mut revoked, now));
        assert_eq!(revoked.approval_state, ApprovalState::Revoked);

        let mut future = identity(LifecycleState::Active, ApprovalState::Valid);
        future.approval.expires_at = Some(now + Duration::days(1));
        assert!(!apply_expiry(&mut future, now));
        assert_eq!(future.status, LifecycleState::Active);
    }

    #[test]
    fn test_normalize() {
        let cases = [
            (LifecycleState::Approved, ApprovalState::Valid, LifecycleState::Active),
            (LifecycleState::Active, ApprovalState::Expired, LifecycleState::UnderReview),
            (LifecycleState::Active, ApprovalState::Missing, LifecycleState::UnderReview),
            (LifecycleState::Discovered, ApprovalState::Revoked, LifecycleState::UnderReview),
            (LifecycleState::Discovered, ApprovalState::Missing, LifecycleState::Discovered),
            (LifecycleState::Deprecated, ApprovalState::Revoked, LifecycleState::Deprecated),
            (LifecycleState::Active, ApprovalState::Valid, LifecycleState::Active),
        ];
        for (status, approval_state, expected) in cases {
            let mut record = identity(status, approval_state);
            normalize(&mut record);
            assert_eq!(record.status, expected, "{status}+{approval_state}");
        }
    }
}
