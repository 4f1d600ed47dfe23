//! Crash-safe file writes.
//!
//! Every governance file (chain, manifest, key) is written to a
//! `NamedTempFile` in the destination directory, fsynced, and renamed over
//! the destination, so readers only ever see a complete old or new file.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::Path,
};

use serde::Serialize;
use tempfile::NamedTempFile;

use wrkr_contracts::error::{WrkrError, WrkrResult};

/// Pretty JSON with a trailing newline, the format of every governance file.
pub fn to_pretty_json<T: Serialize>(value: &T) -> WrkrResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| WrkrError::Serialization {
        reason: e.to_string(),
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Atomically replace `path` with `bytes`.
///
/// `mode` sets Unix permissions on the temp file before any content is
/// written.
pub fn write_atomic(path: &Path, bytes: &[u8], mode: Option<u32>) -> WrkrResult<()> {
    let temp = stage(path, bytes, mode)?;
    temp.persist(path).map_err(|e| WrkrError::Io {
        reason: format!("renaming temp file to {}: {}", path.display(), e.error),
    })?;
    Ok(())
}

/// Publish `bytes` at `path` only if nothing exists there yet.
///
/// Returns `false`, leaving the existing file alone, when another writer won.
pub fn write_new(path: &Path, bytes: &[u8], mode: Option<u32>) -> WrkrResult<bool> {
    let temp = stage(path, bytes, mode)?;
    match temp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(WrkrError::Io {
            reason: format!("publishing {}: {}", path.display(), e.error),
        }),
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> WrkrResult<()> {
    write_atomic(path, &to_pretty_json(value)?, None)
}

fn stage(path: &Path, bytes: &[u8], mode: Option<u32>) -> WrkrResult<NamedTempFile> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| WrkrError::Io {
        reason: format!("creating directory {}: {e}", dir.display()),
    })?;

    let temp = NamedTempFile::new_in(dir).map_err(|e| WrkrError::Io {
        reason: format!("creating temp file in {}: {e}", dir.display()),
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(mode)).map_err(|e| {
                WrkrError::Io {
                    reason: format!("setting permissions on {}: {e}", temp.path().display()),
                }
            })?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = temp.as_file();
    file.write_all(bytes).map_err(|e| WrkrError::Io {
        reason: format!("writing temp file for {}: {e}", path.display()),
    })?;
    file.sync_all().map_err(|e| WrkrError::Io {
        reason: format!("syncing temp file for {}: {e}", path.display()),
    })?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn write_atomic_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        write_json_atomic(&path, &json!({ "v": 1 })).unwrap();
        write_json_atomic(&path, &json!({ "v": 2 })).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["v"], 2);
        // Only the destination remains; the temp file was renamed away.
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn write_new_does_not_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.json");

        assert!(write_new(&path, b"first", None).unwrap());
        assert!(!write_new(&path, b"second", None).unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"first");
    }

    #[cfg(unix)]
    #[test]
    fn mode_is_applied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret.json");
        write_atomic(&path, b"{}", Some(0o600)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
