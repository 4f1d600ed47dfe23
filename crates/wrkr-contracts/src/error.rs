//! Error taxonomy for the Wrkr trust layer.
//!
//! Every fallible operation returns `WrkrResult<T>`. Variants are grouped
//! into categories so operators can tell a missing chain from a tampered one
//! and a bad key from a bad argument.

use thiserror::Error;

/// The unified error type for the Wrkr crates.
#[derive(Debug, Error)]
pub enum WrkrError {
    /// Signing key material or a configuration file is missing or malformed.
    ///
    /// Reported before any record is appended.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The stored public key is not the pair of the stored private key.
    #[error("signing key mismatch for key '{key_id}': public key does not match private key")]
    KeyMismatch { key_id: String },

    /// A lifecycle state name outside the six known states.
    #[error("invalid lifecycle state '{state}'")]
    InvalidState { state: String },

    /// No identity with the given agent id exists in the manifest.
    #[error("agent '{agent_id}' not found in identity manifest")]
    AgentNotFound { agent_id: String },

    /// An approval expiry string could not be parsed.
    #[error("invalid expiry '{raw}': {reason}")]
    InvalidExpiry { raw: String, reason: String },

    /// A required input (framework, chain, observation file) was not supplied.
    #[error("missing input: {reason}")]
    MissingInput { reason: String },

    /// Verification found a hash, link, or signature mismatch.
    ///
    /// Never retried and never downgraded.
    #[error("chain integrity failure at record {index} ('{record_id}'): {reason}")]
    IntegrityFailure {
        index: usize,
        record_id: String,
        reason: String,
    },

    /// A chain file required by a reader does not exist.
    #[error("chain not found at '{path}'")]
    ChainNotFound { path: String },

    /// A chain or input document exists but is not well-formed.
    #[error("parse error in '{path}': {reason}")]
    ChainParse { path: String, reason: String },

    /// A local file read or write failed.
    #[error("i/o error: {reason}")]
    Io { reason: String },

    /// A value could not be encoded or decoded.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    /// The signer could not produce a signature.
    #[error("signing error: {reason}")]
    Signing { reason: String },
}

/// Coarse grouping of `WrkrError` variants, used for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Integrity,
    NotFound,
    Parse,
    Io,
}

impl WrkrError {
    /// Which category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WrkrError::ConfigError { .. } | WrkrError::KeyMismatch { .. } => {
                ErrorCategory::Configuration
            }
            WrkrError::InvalidState { .. }
            | WrkrError::AgentNotFound { .. }
            | WrkrError::InvalidExpiry { .. }
            | WrkrError::MissingInput { .. } => ErrorCategory::Validation,
            WrkrError::IntegrityFailure { .. } => ErrorCategory::Integrity,
            WrkrError::ChainNotFound { .. } => ErrorCategory::NotFound,
            WrkrError::ChainParse { .. } => ErrorCategory::Parse,
            WrkrError::Io { .. } | WrkrError::Serialization { .. } | WrkrError::Signing { .. } => {
                ErrorCategory::Io
            }
        }
    }

    /// Process exit code for the operator CLI.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Io => 1,
            ErrorCategory::Validation => 2,
            ErrorCategory::Configuration => 3,
            ErrorCategory::NotFound => 4,
            ErrorCategory::Parse => 5,
            ErrorCategory::Integrity => 6,
        }
    }
}

/// Convenience alias used throughout the Wrkr crates.
pub type WrkrResult<T> = Result<T, WrkrError>;
