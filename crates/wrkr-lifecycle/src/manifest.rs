//! Identity manifest persistence.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use wrkr_contracts::{
    error::{WrkrError, WrkrResult},
    identity::IdentityManifest,
};
use wrkr_core::{persist, StoreLayout};

/// Reads and writes `identities.json`.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_layout(layout: &StoreLayout) -> Self {
        Self::new(layout.manifest_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest; a missing file is an empty manifest stamped `now`.
    pub fn load(&self, now: DateTime<Utc>) -> WrkrResult<IdentityManifest> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no identity manifest; starting empty");
            return Ok(IdentityManifest::new(now));
        }
        let text = std::fs::read_to_string(&self.path).map_err(|e| WrkrError::Io {
            reason: format!("failed to read manifest '{}': {e}", self.path.display()),
        })?;
        serde_json::from_str(&text).map_err(|e| WrkrError::ChainParse {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Atomically write the manifest with identities sorted by agent id.
    pub fn save(&self, manifest: &IdentityManifest) -> WrkrResult<()> {
        let mut sorted = manifest.clone();
        sorted
            .identities
            .sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        persist::write_json_atomic(&self.path, &sorted)?;
        debug!(
            path = %self.path.display(),
            identities = sorted.identities.len(),
            "identity manifest saved"
        );
        Ok(())
    }
}
