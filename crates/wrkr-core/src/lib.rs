//! # wrkr-core
//!
//! The hashing and signing core of the Wrkr proof chain.
//!
//! This crate provides:
//! - The trait seams (`RecordSigner`, `SignatureVerifier`, `ChainStore`)
//! - The canonical record encoding and `record_hash` computation
//! - The `RecordBuilder` that links, hashes, and signs drafts onto a chain
//! - Crash-safe file writes and the TOML configuration layer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wrkr_core::{RecordBuilder, traits::RecordSigner};
//!
//! let builder = RecordBuilder::new(&signer);
//! builder.append_all(&mut chain, drafts)?;
//! ```

pub mod builder;
pub mod canonical;
pub mod config;
pub mod persist;
pub mod traits;

pub use builder::RecordBuilder;
pub use config::{StoreLayout, WrkrConfig};
