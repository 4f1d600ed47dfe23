//! Governance operations behind the `wrkr` subcommands.
//!
//! Each operation validates its inputs and resolves the signing key before
//! anything is written. The chain is persisted before the identity
//! manifest, so a failed append never leaves the manifest ahead of the
//! chain.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use wrkr_compliance::evaluate_files;
use wrkr_contracts::{
    compliance::ComplianceResult,
    error::{WrkrError, WrkrResult},
    finding::{Finding, RiskReport},
    identity::{ApprovalState, LifecycleState, ObservedTool},
    verify::VerificationResult,
};
use wrkr_lifecycle::{apply_manual_state, parse_expiry, reconcile, ManifestStore, ManualTransition};
use wrkr_proof::ProofStore;
use wrkr_verify::ChainVerifier;

use crate::context::Context;

// ── Cycle ─────────────────────────────────────────────────────────────────────

/// Detector and scorer output for one governance cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleInputs {
    /// JSON array of observed tools.
    pub observed: PathBuf,
    /// JSON array of raw findings.
    pub findings: Option<PathBuf>,
    /// JSON risk report.
    pub risk: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleSummary {
    pub identities: usize,
    pub present: usize,
    pub transitions: usize,
    pub records_appended: usize,
    pub chain_count: usize,
    pub head_hash: String,
}

/// Reconcile observations, map the cycle, and append it to the chain.
pub fn run_cycle(ctx: &Context, inputs: &CycleInputs, now: DateTime<Utc>) -> WrkrResult<CycleSummary> {
    let observed: Vec<ObservedTool> = read_json(&inputs.observed, "observed tools")?;
    let findings: Vec<Finding> = match &inputs.findings {
        Some(path) => read_json(path, "findings")?,
        None => Vec::new(),
    };
    let risk: Option<RiskReport> = inputs
        .risk
        .as_deref()
        .map(|path| read_json(path, "risk report"))
        .transpose()?;

    let mut proof = ProofStore::open(ctx.layout.clone(), ctx.chain_id(), &ctx.env)?;
    let manifests = ManifestStore::for_layout(&ctx.layout);
    let previous = manifests.load(now)?;

    let pass = reconcile(&previous, &observed, now);
    let drafts = ctx
        .mapper()
        .map_cycle(&findings, risk.as_ref(), &pass.transitions, now);
    let appended = proof.append(drafts)?.len();
    let chain = proof.close()?;
    manifests.save(&pass.manifest)?;

    let summary = CycleSummary {
        identities: pass.manifest.identities.len(),
        present: pass.manifest.identities.iter().filter(|i| i.present).count(),
        transitions: pass.transitions.len(),
        records_appended: appended,
        chain_count: chain.len(),
        head_hash: chain.head_hash,
    };
    info!(
        identities = summary.identities,
        transitions = summary.transitions,
        appended,
        "governance cycle complete"
    );
    Ok(summary)
}

// ── Manual transition ─────────────────────────────────────────────────────────

/// An operator decision as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct TransitionArgs {
    pub agent_id: String,
    pub state: String,
    pub approver: String,
    pub scope: String,
    pub reason: Option<String>,
    /// Raw expiry (`90d`, `720h`); approvals default to 90 days.
    pub expires: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionSummary {
    pub agent_id: String,
    pub previous_state: Option<LifecycleState>,
    pub new_state: LifecycleState,
    pub approval_state: ApprovalState,
    pub record_type: String,
    pub record_id: String,
    pub head_hash: String,
}

/// Apply an operator transition and record it on the chain.
pub fn run_transition(
    ctx: &Context,
    args: &TransitionArgs,
    now: DateTime<Utc>,
) -> WrkrResult<TransitionSummary> {
    let state: LifecycleState = args.state.parse()?;
    let approving = matches!(state, LifecycleState::Approved | LifecycleState::Active);
    let expires_at = match args.expires.as_deref() {
        Some(raw) => Some(parse_expiry(raw, now)?),
        None if approving => Some(parse_expiry("", now)?),
        None => None,
    };

    let manifests = ManifestStore::for_layout(&ctx.layout);
    let mut manifest = manifests.load(now)?;
    let request = ManualTransition {
        agent_id: args.agent_id.clone(),
        new_state: args.state.clone(),
        approver: args.approver.clone(),
        scope: args.scope.clone(),
        reason: args.reason.clone(),
        expires_at,
    };
    let transition = apply_manual_state(&mut manifest, &request, now)?;

    let mut proof = ProofStore::open(ctx.layout.clone(), ctx.chain_id(), &ctx.env)?;
    let drafts = ctx.mapper().map_transitions(std::slice::from_ref(&transition));
    let record_type = drafts
        .first()
        .map(|d| d.record_type.as_str().to_string())
        .unwrap_or_default();
    let record_id = proof
        .append(drafts)?
        .pop()
        .map(|id| id.0)
        .unwrap_or_default();
    let chain = proof.close()?;
    manifests.save(&manifest)?;

    let approval_state = manifest
        .get(&transition.agent_id)
        .map(|identity| identity.approval_state)
        .unwrap_or_default();
    Ok(TransitionSummary {
        agent_id: transition.agent_id,
        previous_state: transition.previous_state,
        new_state: transition.new_state,
        approval_state,
        record_type,
        record_id,
        head_hash: chain.head_hash,
    })
}

// ── Verify ────────────────────────────────────────────────────────────────────

/// Replay the store's chain (or `chain`) under the store's key.
pub fn run_verify(ctx: &Context, chain: Option<&Path>) -> WrkrResult<VerificationResult> {
    let path = chain.map(Path::to_path_buf).unwrap_or_else(|| ctx.layout.chain_path());
    if !path.exists() {
        return Err(WrkrError::ChainNotFound {
            path: path.display().to_string(),
        });
    }
    ChainVerifier::for_store(&ctx.layout, &ctx.env)?.verify_path(&path)
}

// ── Compliance ────────────────────────────────────────────────────────────────

pub fn run_compliance(
    ctx: &Context,
    framework: &Path,
    chain: Option<&Path>,
) -> WrkrResult<ComplianceResult> {
    let path = chain.map(Path::to_path_buf).unwrap_or_else(|| ctx.layout.chain_path());
    evaluate_files(framework, &path)
}

// ── Input files ───────────────────────────────────────────────────────────────

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> WrkrResult<T> {
    if !path.exists() {
        return Err(WrkrError::MissingInput {
            reason: format!("{what} file '{}' does not exist", path.display()),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|e| WrkrError::Io {
        reason: format!("failed to read {what} '{}': {e}", path.display()),
    })?;
    serde_json::from_str(&text).map_err(|e| WrkrError::ChainParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
