// FILE: src/storage/lookup.rs
//! Two-phase resolution of a logical key to the file that backs it.
//!
//! Phase one probes the common extensions directly (a handful of stat calls,
//! no directory scan). Phase two falls back to a full directory listing and
//! matches on the file name minus its extension, which also covers records
//! written with uncommon extensions.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::content_type::COMMON_EXTENSIONS;
use crate::error::{Result, StorageError};

/// Probe `<dir>/<key>.<ext>` for every common extension, in probe order.
pub(crate) async fn probe_common(dir: &Path, key: &str) -> Option<PathBuf> {
    for ext in COMMON_EXTENSIONS {
        let candidate = dir.join(format!("{key}.{ext}"));
        if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

/// Scan the whole directory for any file whose stem equals `key`.
///
/// A missing directory means the store itself is gone and surfaces as
/// `NotFound`.
pub(crate) async fn scan_directory(dir: &Path, key: &str) -> Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StorageError::NotFound(format!(
                "key-value store directory {}",
                dir.display()
            )));
        }
        Err(e) => {
            return Err(StorageError::io(
                format!("scanning store directory {}", dir.display()),
                e,
            ));
        }
    };

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StorageError::io(format!("scanning store directory {}", dir.display()), e))?
    {
        let name = entry.file_name();
        let stem = Path::new(&name).file_stem().and_then(|s| s.to_str());
        if stem == Some(key) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

/// Resolve `key` to its backing file, or `None` when the store directory
/// exists but holds no such key.
pub(crate) async fn resolve(dir: &Path, key: &str) -> Result<Option<PathBuf>> {
    if let Some(path) = probe_common(dir, key).await {
        return Ok(Some(path));
    }
    scan_directory(dir, key).await
}
