//! Grouping of raw findings by canonical key.

use std::{cmp::Ordering, collections::BTreeMap};

use wrkr_contracts::finding::Finding;

use crate::key::{canonical_key, precedence, sort_key, tie_break};

/// All raw findings sharing one canonical key.
#[derive(Debug, Clone, PartialEq)]
pub struct FindingGroup<'a> {
    pub key: String,
    /// The finding whose payload represents the group on the chain.
    pub representative: &'a Finding,
    /// Every member, in canonical order.
    pub members: Vec<&'a Finding>,
}

impl FindingGroup<'_> {
    /// Sorted, unique, non-empty values of `field` across members.
    pub fn linked<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(&Finding) -> &str,
    {
        let mut values: Vec<String> = self
            .members
            .iter()
            .map(|f| field(*f))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        values.sort();
        values.dedup();
        values
    }
}

/// Group `findings` by canonical key, in key order.
///
/// The representative is the member with the best precedence
/// (`skill_policy_conflict`, then `policy_violation`/`WRKR-014`, then
/// `policy_check`/`WRKR-014`), ties broken by canonical order.
pub fn group_findings(findings: &[Finding]) -> Vec<FindingGroup<'_>> {
    let mut groups: BTreeMap<String, Vec<&Finding>> = BTreeMap::new();
    for finding in findings {
        groups.entry(canonical_key(finding)).or_default().push(finding);
    }

    groups
        .into_iter()
        .filter_map(|(key, mut members)| {
            members.sort_by(|a, b| canonical_order(a, b));
            let representative = members.iter().copied().min_by_key(|f| precedence(f))?;
            Some(FindingGroup {
                key,
                representative,
                members,
            })
        })
        .collect()
}

fn canonical_order(a: &Finding, b: &Finding) -> Ordering {
    sort_key(a)
        .cmp(&sort_key(b))
        .then_with(|| a.agent_id.cmp(&b.agent_id))
        .then_with(|| tie_break(&a.evidence).cmp(&tie_break(&b.evidence)))
}
