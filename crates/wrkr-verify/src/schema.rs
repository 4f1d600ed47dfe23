//! Structural JSON Schema for chain documents.
//!
//! A document that fails this schema is a parse error, not tampering: hash
//! and signature fields are only required to be strings, so corrupted
//! values still reach the replay and are reported as integrity failures.

use serde_json::{json, Value};

pub fn chain_document_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["chain_id", "records", "head_hash"],
        "properties": {
            "chain_id": { "type": "string", "minLength": 1 },
            "head_hash": { "type": "string" },
            "records": { "type": "array", "items": { "$ref": "#/$defs/record" } }
        },
        "$defs": {
            "record": {
                "type": "object",
                "required": [
                    "record_id", "record_type", "timestamp",
                    "source", "source_product", "integrity"
                ],
                "properties": {
                    "record_id": { "type": "string", "minLength": 1 },
                    "record_type": {
                        "enum": ["scan_finding", "risk_assessment", "approval", "decision"]
                    },
                    "timestamp": { "type": "string" },
                    "source": { "type": "string" },
                    "source_product": { "type": "string" },
                    "agent_id": { "type": "string" },
                    "event": { "type": "object" },
                    "metadata": { "type": "object" },
                    "controls": {
                        "type": "object",
                        "properties": {
                            "permissions_enforced": { "type": "boolean" },
                            "approved_scope": { "type": "string" },
                            "within_scope": { "type": "boolean" }
                        }
                    },
                    "integrity": {
                        "type": "object",
                        "required": [
                            "previous_record_hash", "record_hash",
                            "signature", "signing_key_id"
                        ],
                        "properties": {
                            "previous_record_hash": { "type": "string" },
                            "record_hash": { "type": "string" },
                            "signature": { "type": "string" },
                            "signing_key_id": { "type": "string" }
                        }
                    }
                }
            }
        }
    })
}
