//! The record builder: hash chaining and signing.
//!
//! For each draft the builder
//!
//!   1. sets `previous_record_hash` to the chain's current head
//!   2. computes `record_hash` over the canonical encoding
//!   3. signs the digest and stores `signature` and `signing_key_id`
//!   4. appends the record and advances `head_hash`
//!
//! Altering any historical record changes its hash, which breaks the
//! `previous_record_hash` of every later record.

use tracing::{debug, info};

use wrkr_contracts::{
    error::WrkrResult,
    record::{Chain, Integrity, Record, RecordDraft, RecordId},
};

use crate::{canonical, traits::RecordSigner};

/// Links, hashes, and signs drafts onto a chain.
pub struct RecordBuilder<'a> {
    signer: &'a dyn RecordSigner,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(signer: &'a dyn RecordSigner) -> Self {
        Self { signer }
    }

    /// Build a signed record that follows `previous_hash`, without appending.
    pub fn seal(&self, previous_hash: &str, draft: RecordDraft) -> WrkrResult<Record> {
        let integrity = Integrity {
            previous_record_hash: previous_hash.to_string(),
            record_hash: String::new(),
            signature: String::new(),
            signing_key_id: self.signer.key_id().to_string(),
        };
        let mut record = Record::from_draft(RecordId::new(), draft, integrity);

        let digest = canonical::record_digest(&record)?;
        record.integrity.record_hash = hex::encode(digest);
        record.integrity.signature = self.signer.sign(&digest)?;

        debug!(
            record_id = %record.record_id,
            record_type = %record.record_type,
            record_hash = %record.integrity.record_hash,
            "record sealed"
        );
        Ok(record)
    }

    /// Append one draft to `chain`.
    pub fn append(&self, chain: &mut Chain, draft: RecordDraft) -> WrkrResult<RecordId> {
        let record = self.seal(&chain.head_hash, draft)?;
        let id = record.record_id.clone();
        chain.head_hash = record.integrity.record_hash.clone();
        chain.records.push(record);
        Ok(id)
    }

    /// Append a batch in order. Either every draft is appended or none is.
    pub fn append_all(
        &self,
        chain: &mut Chain,
        drafts: impl IntoIterator<Item = RecordDraft>,
    ) -> WrkrResult<Vec<RecordId>> {
        let mut head = chain.head_hash.clone();
        let mut sealed = Vec::new();
        for draft in drafts {
            let record = self.seal(&head, draft)?;
            head = record.integrity.record_hash.clone();
            sealed.push(record);
        }

        let ids: Vec<RecordId> = sealed.iter().map(|r| r.record_id.clone()).collect();
        chain.records.extend(sealed);
        chain.head_hash = head;

        info!(
            chain_id = %chain.chain_id,
            appended = ids.len(),
            count = chain.records.len(),
            head_hash = %chain.head_hash,
            "records appended"
        );
        Ok(ids)
    }
}
