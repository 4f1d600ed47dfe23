//! Canonical encoding and record hashing.
//!
//! The encoding is part of the on-disk contract: chains written today must
//! verify with every later version.
//!
//! Encoding `wrkr-proof-v1`, in order:
//!   1. serialize the record with serde_json (absent optionals omitted,
//!      timestamps as chrono RFC 3339, numbers in shortest round-trip form)
//!   2. remove `integrity.record_hash` and `integrity.signature`
//!   3. sort every object's keys by byte order, recursively
//!   4. emit compact JSON with no whitespace
//!
//! `record_hash` is the lowercase hex SHA-256 of those bytes. The signature
//! is computed over the raw 32-byte digest.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use wrkr_contracts::{
    error::{WrkrError, WrkrResult},
    record::Record,
};

/// Identifier of the encoding described above.
pub const CANONICAL_ENCODING: &str = "wrkr-proof-v1";

/// Compact JSON with recursively sorted object keys.
pub fn canonical_json_bytes<T: Serialize>(value: &T) -> WrkrResult<Vec<u8>> {
    let raw = serde_json::to_value(value).map_err(serialization)?;
    serde_json::to_vec(&normalize(raw)).map_err(serialization)
}

/// The exact bytes hashed for `record`.
pub fn record_hash_input(record: &Record) -> WrkrResult<Vec<u8>> {
    let raw = serde_json::to_value(record).map_err(serialization)?;
    stored_hash_input(&raw)
}

/// The bytes hashed for a record object as it appears in a chain document.
///
/// Every member of the object is covered, including members `Record` does
/// not declare.
pub fn stored_hash_input(stored: &Value) -> WrkrResult<Vec<u8>> {
    let mut raw = stored.clone();
    if let Some(integrity) = raw.get_mut("integrity").and_then(Value::as_object_mut) {
        integrity.remove("record_hash");
        integrity.remove("signature");
    }
    serde_json::to_vec(&normalize(raw)).map_err(serialization)
}

/// SHA-256 digest of the canonical encoding of `record`.
pub fn record_digest(record: &Record) -> WrkrResult<[u8; 32]> {
    let bytes = record_hash_input(record)?;
    Ok(Sha256::digest(&bytes).into())
}

/// SHA-256 digest of a stored record object.
pub fn stored_record_digest(stored: &Value) -> WrkrResult<[u8; 32]> {
    let bytes = stored_hash_input(stored)?;
    Ok(Sha256::digest(&bytes).into())
}

/// Hex `record_hash` of `record`.
pub fn record_hash(record: &Record) -> WrkrResult<String> {
    Ok(hex::encode(record_digest(record)?))
}

fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k, v);
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

fn serialization(e: serde_json::Error) -> WrkrError {
    WrkrError::Serialization {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use wrkr_contracts::{
        record::{Controls, Integrity, Record, RecordId, RecordType},
        value::payload,
    };

    use super::*;

    fn record() -> Record {
        Record {
            record_id: RecordId("rec-fixed".to_string()),
            record_type: RecordType::ScanFinding,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            source: "wrkr".to_string(),
            source_product: "wrkr".to_string(),
            agent_id: None,
            event: payload([("severity", "high"), ("finding_type", "mcp_server")]),
            metadata: payload([("merged_finding_count", 2usize)]),
            controls: Controls::default(),
            integrity: Integrity {
                previous_record_hash: "00".repeat(32),
                record_hash: String::new(),
                signature: String::new(),
                signing_key_id: "k1".to_string(),
            },
        }
    }

    #[test]
    fn canonical_json_orders_object_keys() {
        let value = json!({ "z": 1, "a": { "d": 4, "b": 2 }, "arr": [{ "k2": 2, "k1": 1 }] });
        let text = String::from_utf8(canonical_json_bytes(&value).unwrap()).unwrap();
        assert_eq!(text, r#"{"a":{"b":2,"d":4},"arr":[{"k1":1,"k2":2}],"z":1}"#);
    }

    #[test]
    fn hash_excludes_record_hash_and_signature() {
        let a = record();
        let mut b = record();
        b.integrity.record_hash = "ff".repeat(32);
        b.integrity.signature = "c2lnbmF0dXJl".to_string();
        assert_eq!(record_hash(&a).unwrap(), record_hash(&b).unwrap());
    }

    #[test]
    fn hash_commits_to_linkage_and_key_id() {
        let a = record();
        let mut linked = record();
        linked.integrity.previous_record_hash = "11".repeat(32);
        let mut rekeyed = record();
        rekeyed.integrity.signing_key_id = "k2".to_string();

        let base = record_hash(&a).unwrap();
        assert_ne!(base, record_hash(&linked).unwrap());
        assert_ne!(base, record_hash(&rekeyed).unwrap());
    }

    #[test]
    fn hash_is_stable_across_serde_round_trip() {
        let original = record();
        let json = serde_json::to_string_pretty(&original).unwrap();
        let decoded: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(record_hash(&original).unwrap(), record_hash(&decoded).unwrap());
    }

    #[test]
    fn stored_digest_matches_typed_digest() {
        let original = record();
        let text = serde_json::to_string_pretty(&original).unwrap();
        let stored: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(record_digest(&original).unwrap(), stored_record_digest(&stored).unwrap());
    }

    #[test]
    fn stored_digest_covers_undeclared_members() {
        let stored = serde_json::to_value(record()).unwrap();
        let mut injected = stored.clone();
        injected["approver"] = json!("mallory");
        let mut widened = stored.clone();
        widened["controls"]["approved_by_override"] = json!("mallory");

        let base = stored_record_digest(&stored).unwrap();
        assert_ne!(base, stored_record_digest(&injected).unwrap());
        assert_ne!(base, stored_record_digest(&widened).unwrap());
    }

    #[test]
    fn hash_is_64_lowercase_hex() {
        let h = record_hash(&record()).unwrap();
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
