// FILE: src/content_type.rs
//! Mapping between MIME content types and on-disk file extensions.
//!
//! The mapping is pure and bidirectionally consistent for every extension in
//! [`COMMON_EXTENSIONS`], which is also the probe order used by key lookup.

use std::path::Path;

/// Extensions probed directly before falling back to a full directory scan,
/// most common first.
pub const COMMON_EXTENSIONS: &[&str] = &[
    "json", "bin", "txt", "html", "xml", "jpeg", "png", "pdf", "mp3", "js", "css", "csv",
];

/// Extension used when a content type has no known mapping.
pub const DEFAULT_EXTENSION: &str = "bin";

/// Content type reported for files with no known extension mapping.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

const TABLE: &[(&str, &str)] = &[
    ("application/json", "json"),
    ("application/octet-stream", "bin"),
    ("text/plain", "txt"),
    ("text/html", "html"),
    ("application/xml", "xml"),
    ("image/jpeg", "jpeg"),
    ("image/png", "png"),
    ("application/pdf", "pdf"),
    ("audio/mpeg", "mp3"),
    ("text/javascript", "js"),
    ("text/css", "css"),
    ("text/csv", "csv"),
];

/// Lowercased media type with any parameters (e.g. `; charset=utf-8`) stripped.
pub(crate) fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

pub fn is_json(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence == "application/json" || essence.ends_with("+json")
}

/// File extension for a content type, falling back to [`DEFAULT_EXTENSION`].
pub fn extension_for(content_type: &str) -> &'static str {
    let essence = essence(content_type);
    TABLE
        .iter()
        .find(|(ct, _)| *ct == essence)
        .map(|(_, ext)| *ext)
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Content type inferred from a file's extension, falling back to
/// [`DEFAULT_CONTENT_TYPE`].
pub fn content_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return DEFAULT_CONTENT_TYPE;
    };
    let ext = ext.to_ascii_lowercase();
    TABLE
        .iter()
        .find(|(_, e)| *e == ext)
        .map(|(ct, _)| *ct)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
