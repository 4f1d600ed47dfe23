//! `ProofStore`: an explicit handle on one governance store.
//!
//! The handle owns the signing key and the in-memory chain for the duration
//! of a governance cycle: `open` → `append` → `close`. Key problems surface
//! in `open`, before anything can be appended.

use tracing::info;

use wrkr_contracts::{
    error::WrkrResult,
    record::{Chain, RecordDraft, RecordId},
};
use wrkr_core::{traits::ChainStore, RecordBuilder, StoreLayout};

use crate::{
    keys::{load_or_create_signing_key, KeyEnv, SigningKeyMaterial, VerifierKey},
    store::JsonChainStore,
};

/// A writer's handle on a governance store.
///
/// Not synchronized: at most one handle may write a store at a time.
#[derive(Debug)]
pub struct ProofStore {
    layout: StoreLayout,
    store: JsonChainStore,
    key: SigningKeyMaterial,
    chain: Chain,
    unsaved: usize,
}

impl ProofStore {
    /// Resolve the signing key and load (or start) the chain.
    pub fn open(layout: StoreLayout, chain_id: &str, env: &KeyEnv) -> WrkrResult<Self> {
        let key = load_or_create_signing_key(&layout, env)?;
        let store = JsonChainStore::new(chain_id);
        let chain = store.load(&layout.chain_path())?;
        info!(
            root = %layout.root().display(),
            chain_id = %chain.chain_id,
            count = chain.records.len(),
            key_id = %key.verifier_key().key_id,
            "proof store opened"
        );
        Ok(Self {
            layout,
            store,
            key,
            chain,
            unsaved: 0,
        })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn verifier_key(&self) -> VerifierKey {
        self.key.verifier_key()
    }

    /// Hash, sign, and append `drafts` in order.
    pub fn append(&mut self, drafts: Vec<RecordDraft>) -> WrkrResult<Vec<RecordId>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let ids = RecordBuilder::new(&self.key).append_all(&mut self.chain, drafts)?;
        self.unsaved += ids.len();
        Ok(ids)
    }

    /// Persist appended records, if any.
    pub fn flush(&mut self) -> WrkrResult<()> {
        if self.unsaved == 0 {
            return Ok(());
        }
        self.store.save(&self.layout.chain_path(), &self.chain)?;
        self.unsaved = 0;
        Ok(())
    }

    /// Flush and release the handle, returning the final chain.
    pub fn close(mut self) -> WrkrResult<Chain> {
        self.flush()?;
        info!(
            chain_id = %self.chain.chain_id,
            count = self.chain.records.len(),
            head_hash = %self.chain.head_hash,
            "proof store closed"
        );
        Ok(self.chain)
    }
}
