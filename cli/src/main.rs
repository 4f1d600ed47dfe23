//! Wrkr operator CLI for the governance trust layer.
//!
//! Wires the reconciler, canonical mapper, proof store, verifier, and
//! compliance evaluator together over one governance store directory.
//! Detector and risk-scorer output is read from JSON files.
//!
//! Usage:
//!   wrkr cycle --observed observed.json --findings findings.json --risk risk.json
//!   wrkr transition wrkr:github-mcp:acme approved --approver secops --scope repo:payments
//!   wrkr verify
//!   wrkr compliance --framework frameworks/baseline.toml
//!
//! Exit codes: 0 ok, 1 i/o, 2 validation, 3 configuration, 4 not found,
//! 5 parse, 6 integrity failure.

mod commands;
mod context;

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use wrkr_contracts::error::{WrkrError, WrkrResult};
use wrkr_proof::KeyEnv;

use crate::{
    commands::{CycleInputs, TransitionArgs},
    context::Context,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Tamper-evident governance for AI tooling.
///
/// Every governance event is hashed, signed, and appended to the proof
/// chain in the store directory.
#[derive(Parser)]
#[command(
    name = "wrkr",
    about = "Tamper-evident governance for AI agent tooling",
    long_about = "Reconciles discovered AI tools into a governed inventory, records every\n\
                  governance event on a signed hash chain, and checks that chain for\n\
                  tampering and compliance coverage."
)]
struct Cli {
    /// Governance store directory (overrides `[store] root`).
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Configuration file (defaults to ./wrkr.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile observed tools and append the cycle's records.
    Cycle {
        /// JSON array of observed tools.
        #[arg(long)]
        observed: PathBuf,
        /// JSON array of raw detector findings.
        #[arg(long)]
        findings: Option<PathBuf>,
        /// JSON risk report.
        #[arg(long)]
        risk: Option<PathBuf>,
    },
    /// Move an identity to a new lifecycle state.
    Transition {
        agent_id: String,
        /// discovered, under_review, approved, active, deprecated, revoked
        state: String,
        #[arg(long, default_value = "")]
        approver: String,
        #[arg(long, default_value = "")]
        scope: String,
        #[arg(long)]
        reason: Option<String>,
        /// Approval expiry: `90d`, `720h`, `1h30m`. Approvals default to 90 days.
        #[arg(long)]
        expires: Option<String>,
    },
    /// Replay the proof chain's hashes, links, and signatures.
    Verify {
        /// Chain file to verify instead of the store's.
        #[arg(long)]
        chain: Option<PathBuf>,
    },
    /// Evaluate control coverage of the proof chain.
    Compliance {
        /// Framework definition (.toml or .json).
        #[arg(long)]
        framework: PathBuf,
        #[arg(long)]
        chain: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for per-record detail.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("wrkr: {e}");
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> WrkrResult<()> {
    let ctx = Context::load(cli.config.as_deref(), cli.store, KeyEnv::from_env())?;
    let now = Utc::now();

    match cli.command {
        Command::Cycle {
            observed,
            findings,
            risk,
        } => {
            let inputs = CycleInputs {
                observed,
                findings,
                risk,
            };
            print_json(&commands::run_cycle(&ctx, &inputs, now)?)
        }
        Command::Transition {
            agent_id,
            state,
            approver,
            scope,
            reason,
            expires,
        } => {
            let args = TransitionArgs {
                agent_id,
                state,
                approver,
                scope,
                reason,
                expires,
            };
            print_json(&commands::run_transition(&ctx, &args, now)?)
        }
        Command::Verify { chain } => {
            let result = commands::run_verify(&ctx, chain.as_deref())?;
            print_json(&result)?;
            result.into_result().map(|_| ())
        }
        Command::Compliance { framework, chain } => {
            print_json(&commands::run_compliance(&ctx, &framework, chain.as_deref())?)
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_json<T: Serialize>(value: &T) -> WrkrResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| WrkrError::Serialization {
        reason: e.to_string(),
    })?;
    println!("{text}");
    Ok(())
}
