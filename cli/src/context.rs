//! Per-invocation context: configuration, store layout, key material.

use std::path::{Path, PathBuf};

use wrkr_canon::CanonicalMapper;
use wrkr_contracts::error::WrkrResult;
use wrkr_core::{StoreLayout, WrkrConfig};
use wrkr_proof::KeyEnv;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "wrkr.toml";

#[derive(Debug, Clone)]
pub struct Context {
    pub config: WrkrConfig,
    pub layout: StoreLayout,
    pub env: KeyEnv,
}

impl Context {
    /// Resolve configuration; `store` overrides `[store] root`.
    pub fn load(config_path: Option<&Path>, store: Option<PathBuf>, env: KeyEnv) -> WrkrResult<Self> {
        let mut config = match config_path {
            Some(path) => WrkrConfig::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                WrkrConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => WrkrConfig::default(),
        };
        if let Some(root) = store {
            config.store.root = root;
        }
        Ok(Self::new(config, env))
    }

    pub fn new(config: WrkrConfig, env: KeyEnv) -> Self {
        let layout = config.layout();
        Self {
            config,
            layout,
            env,
        }
    }

    pub fn mapper(&self) -> CanonicalMapper {
        CanonicalMapper::new(
            self.config.records.source.clone(),
            self.config.records.source_product.clone(),
        )
    }

    pub fn chain_id(&self) -> &str {
        &self.config.store.chain_id
    }
}
