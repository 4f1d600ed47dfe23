//! # wrkr-lifecycle
//!
//! The identity lifecycle state machine.
//!
//! Every tool or agent the detectors report becomes an `IdentityRecord` in
//! the identity manifest. [`reconcile::reconcile`] folds a fresh observation
//! set into the previous manifest, and [`manual::apply_manual_state`] applies
//! operator decisions. Both return `Transition`s for the proof chain.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wrkr_lifecycle::{reconcile, ManifestStore};
//!
//! let store = ManifestStore::for_layout(&layout);
//! let previous = store.load(now)?;
//! let pass = reconcile(&previous, &observed, now);
//! store.save(&pass.manifest)?;
//! ```

pub mod expiry;
pub mod manifest;
pub mod manual;
pub mod reconcile;
pub mod state;

pub use expiry::parse_expiry;
pub use manifest::ManifestStore;
pub use manual::{apply_manual_state, ManualTransition};
pub use reconcile::{reconcile, Reconciliation};

// ── Tests ─────────────────────────────────────────────────────────────────────
