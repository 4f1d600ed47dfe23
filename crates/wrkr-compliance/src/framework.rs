//! Framework definition loading.
//!
//! Frameworks are supplied as TOML or JSON; the file extension decides.
//!
//! ```toml
//! framework_id = "eu-ai-act"
//! version = "2024"
//! title = "EU AI Act"
//!
//! [[controls]]
//! id = "art-12"
//! title = "Record keeping"
//! required_record_types = ["scan_finding"]
//! required_fields = ["record_id", "integrity.record_hash"]
//!
//!   [[controls.controls]]
//!   id = "art-12.2"
//!   required_record_types = ["approval"]
//!   required_fields = ["controls.approved_scope"]
//! ```

use std::path::Path;

use wrkr_contracts::{
    compliance::{Control, Framework},
    error::{WrkrError, WrkrResult},
};

pub fn framework_from_toml_str(s: &str) -> WrkrResult<Framework> {
    toml::from_str(s).map_err(|e| WrkrError::ChainParse {
        path: "<framework>".to_string(),
        reason: format!("failed to parse framework TOML: {e}"),
    })
}

pub fn framework_from_json_str(s: &str) -> WrkrResult<Framework> {
    serde_json::from_str(s).map_err(|e| WrkrError::ChainParse {
        path: "<framework>".to_string(),
        reason: format!("failed to parse framework JSON: {e}"),
    })
}

/// Read a framework from `path`: `.toml` as TOML, anything else as JSON.
pub fn load_framework(path: &Path) -> WrkrResult<Framework> {
    if !path.exists() {
        return Err(WrkrError::MissingInput {
            reason: format!("framework file '{}' does not exist", path.display()),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| WrkrError::Io {
        reason: format!("failed to read framework '{}': {e}", path.display()),
    })?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let parsed = if is_toml {
        framework_from_toml_str(&contents)
    } else {
        framework_from_json_str(&contents)
    };
    parsed.map_err(|e| match e {
        WrkrError::ChainParse { reason, .. } => WrkrError::ChainParse {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}

/// Every control in the tree, children included, sorted by id.
pub fn flatten_controls(framework: &Framework) -> Vec<&Control> {
    fn walk<'a>(controls: &'a [Control], out: &mut Vec<&'a Control>) {
        for control in controls {
            out.push(control);
            walk(&control.controls, out);
        }
    }

    let mut flat = Vec::new();
    walk(&framework.controls, &mut flat);
    flat.sort_by(|a, b| a.id.cmp(&b.id));
    flat
}
