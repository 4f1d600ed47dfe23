//! # wrkr-proof
//!
//! Signing keys and durable storage for the Wrkr proof chain.
//!
//! ## Overview
//!
//! Every governance event becomes a `Record` signed with the store's Ed25519
//! key and linked to its predecessor by SHA-256 hash. This crate resolves
//! that key (environment, key file, or first-use generation), persists the
//! chain as a crash-safe JSON file, and wraps both in a `ProofStore` handle.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wrkr_proof::{KeyEnv, ProofStore};
//!
//! let mut store = ProofStore::open(layout, "wrkr-proof", &KeyEnv::from_env())?;
//! store.append(drafts)?;
//! let chain = store.close()?;
//! ```

pub mod handle;
pub mod keys;
pub mod store;

pub use handle::ProofStore;
pub use keys::{
    load_or_create_signing_key, load_verifier_key, KeyEnv, KeyRing, SigningKeyMaterial,
    VerifierKey,
};
pub use store::JsonChainStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
