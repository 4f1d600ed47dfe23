//! JSON file implementation of `ChainStore`.
//!
//! The chain file is one indented JSON document, `{chain_id, records,
//! head_hash}`, with records in append order and a trailing newline so it
//! diffs cleanly under version control.

use std::path::Path;

use tracing::{debug, warn};

use wrkr_contracts::{
    error::{WrkrError, WrkrResult},
    record::Chain,
};
use wrkr_core::{persist, traits::ChainStore};

/// Chain store backed by a single JSON file per chain.
#[derive(Debug, Clone)]
pub struct JsonChainStore {
    chain_id: String,
}

impl JsonChainStore {
    /// A store whose missing chains start empty under `chain_id`.
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
        }
    }

    /// Load a chain that must already exist.
    ///
    /// Readers that need history (verification, compliance evidence) use
    /// this instead of `load` so an absent file is `ChainNotFound`.
    pub fn load_existing(&self, path: &Path) -> WrkrResult<Chain> {
        if !path.exists() {
            return Err(WrkrError::ChainNotFound {
                path: path.display().to_string(),
            });
        }
        read_chain(path)
    }
}

/// Read and parse the chain file at `path`.
pub fn read_chain(path: &Path) -> WrkrResult<Chain> {
    let text = std::fs::read_to_string(path).map_err(|e| WrkrError::Io {
        reason: format!("failed to read chain '{}': {e}", path.display()),
    })?;
    serde_json::from_str(&text).map_err(|e| WrkrError::ChainParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

impl ChainStore for JsonChainStore {
    fn load(&self, path: &Path) -> WrkrResult<Chain> {
        if !path.exists() {
            debug!(path = %path.display(), chain_id = %self.chain_id, "no chain file; starting empty chain");
            return Ok(Chain::new(self.chain_id.clone()));
        }
        let chain = read_chain(path)?;
        if chain.chain_id != self.chain_id {
            warn!(
                path = %path.display(),
                expected = %self.chain_id,
                found = %chain.chain_id,
                "chain file has a different chain_id than configured"
            );
        }
        Ok(chain)
    }

    fn save(&self, path: &Path, chain: &Chain) -> WrkrResult<()> {
        persist::write_json_atomic(path, chain)?;
        debug!(
            path = %path.display(),
            count = chain.records.len(),
            head_hash = %chain.head_hash,
            "chain saved"
        );
        Ok(())
    }
}
