//! # wrkr-contracts
//!
//! Shared types, payload values, and error taxonomy for the Wrkr governance
//! trust layer.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions and error types.

pub mod compliance;
pub mod error;
pub mod finding;
pub mod identity;
pub mod record;
pub mod value;
pub mod verify;
