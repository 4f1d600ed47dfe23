//! Trait seams of the proof chain.
//!
//! - `RecordSigner`: holds a private key, signs record digests
//! - `SignatureVerifier`: resolves a `signing_key_id` and checks a signature
//! - `ChainStore`: durable load/save of a named chain
//!
//! The record builder and the verifier depend only on these traits, so key
//! storage and chain persistence can be swapped without touching hashing.

use std::path::Path;

use wrkr_contracts::{error::WrkrResult, record::Chain};

/// Signs the SHA-256 digest of a record.
pub trait RecordSigner: Send + Sync {
    /// The id written to `integrity.signing_key_id`.
    fn key_id(&self) -> &str;

    /// Sign `digest` and return the encoded signature.
    fn sign(&self, digest: &[u8]) -> WrkrResult<String>;
}

/// Outcome of checking one record signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    Valid,
    Invalid,
    /// No key with the record's `signing_key_id` is known.
    UnknownKey,
}

/// Verifies record signatures by key id.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, key_id: &str, digest: &[u8], signature: &str) -> SignatureCheck;
}

/// Durable, ordered persistence for a chain.
///
/// Implementations do not lock: one writer per path at a time.
pub trait ChainStore: Send + Sync {
    /// Load the chain at `path`. A missing file is an empty chain.
    fn load(&self, path: &Path) -> WrkrResult<Chain>;

    /// Persist `chain` so a crash never leaves a partial file behind.
    fn save(&self, path: &Path, chain: &Chain) -> WrkrResult<()>;
}
