//! Workspace configuration and governance-store layout.
//!
//! Configuration is an optional TOML file; every key has a default so an
//! empty file (or no file) is valid.
//!
//! ```toml
//! [store]
//! root = ".wrkr"
//! chain_id = "wrkr-proof"
//!
//! [records]
//! source = "wrkr"
//! source_product = "wrkr"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use wrkr_contracts::error::{WrkrError, WrkrResult};

pub const DEFAULT_STORE_ROOT: &str = ".wrkr";
pub const DEFAULT_CHAIN_ID: &str = "wrkr-proof";
pub const DEFAULT_SOURCE: &str = "wrkr";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrkrConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub records: RecordConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            chain_id: default_chain_id(),
        }
    }
}

/// Provenance stamped on every record this process emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordConfig {
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_source")]
    pub source_product: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            source_product: default_source(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_ROOT)
}

fn default_chain_id() -> String {
    DEFAULT_CHAIN_ID.to_string()
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

impl WrkrConfig {
    /// Parse `s` as TOML configuration.
    ///
    /// Returns `WrkrError::ConfigError` if the TOML is malformed.
    pub fn from_toml_str(s: &str) -> WrkrResult<Self> {
        toml::from_str(s).map_err(|e| WrkrError::ConfigError {
            reason: format!("failed to parse config TOML: {e}"),
        })
    }

    /// Read and parse the configuration file at `path`.
    pub fn from_file(path: &Path) -> WrkrResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WrkrError::ConfigError {
            reason: format!("failed to read config file '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn layout(&self) -> StoreLayout {
        StoreLayout::new(&self.store.root)
    }
}

/// Deterministic file paths inside a governance store directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub const CHAIN_FILE: &'static str = "proof-chain.json";
    pub const KEY_FILE: &'static str = "proof-signing-key.json";
    pub const MANIFEST_FILE: &'static str = "identities.json";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chain_path(&self) -> PathBuf {
        self.root.join(Self::CHAIN_FILE)
    }

    pub fn key_path(&self) -> PathBuf {
        self.root.join(Self::KEY_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(Self::MANIFEST_FILE)
    }
}
