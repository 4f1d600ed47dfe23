//! # wrkr-canon
//!
//! Canonicalization of governance events into proof record drafts.
//!
//! Detectors overlap: a rule engine and a skill-privilege scanner can both
//! flag the same conflict under different labels. This crate collapses raw
//! findings to one record per canonical condition, maps risk reports and
//! lifecycle transitions to records, and keeps the whole output
//! deterministic so the same cycle always produces the same drafts.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wrkr_canon::CanonicalMapper;
//!
//! let mapper = CanonicalMapper::new("wrkr", "wrkr");
//! let drafts = mapper.map_cycle(&findings, Some(&risk), &transitions, now);
//! proof_store.append(drafts)?;
//! ```

pub mod findings;
pub mod key;
pub mod mapper;

pub use findings::{group_findings, FindingGroup};
pub use key::canonical_key;
pub use mapper::CanonicalMapper;

// ── Tests ─────────────────────────────────────────────────────────────────────
