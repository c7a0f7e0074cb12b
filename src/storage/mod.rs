// FILE: src/storage/mod.rs
pub mod connection;
pub mod lookup;
pub mod store;

// Common exports
pub use connection::{ConnectionCache, ConnectionOptions, SharedConnection};
pub use store::KeyValueStore;

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

/// Page size used when `list_keys` is called without an explicit limit,
/// matching the remote API default.
pub const DEFAULT_LIST_KEYS_LIMIT: usize = 1000;

/// Store-level metadata, derived entirely from directory stat info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub id: String,
    pub name: String,
    pub created_at: SystemTime,
    pub modified_at: SystemTime,
    pub accessed_at: SystemTime,
}

/// Value accepted by `set_record`.
pub enum RecordValue {
    /// Any JSON-serializable value (objects, arrays, numbers, ...).
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
    /// A readable byte stream, piped to the destination file.
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.debug_tuple("Stream").finish(),
        }
    }
}

/// Input to `set_record`. When `content_type` is `None` it is inferred from
/// the value shape.
#[derive(Debug)]
pub struct NewRecord {
    pub key: String,
    pub value: RecordValue,
    pub content_type: Option<String>,
}

impl NewRecord {
    pub fn new(key: impl Into<String>, value: RecordValue) -> Self {
        Self {
            key: key.into(),
            value,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Decoded payload returned by `get_record`.
#[derive(Debug)]
pub enum RecordPayload {
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
    Stream(tokio::fs::File),
}

impl RecordPayload {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A record as returned by `get_record`.
#[derive(Debug)]
pub struct Record {
    pub key: String,
    pub content_type: String,
    pub value: RecordPayload,
}

/// Raw-mode switches for `get_record`. `stream` takes precedence over
/// `buffer`; with neither set the body is parsed according to content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetRecordOptions {
    pub buffer: bool,
    pub stream: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ListKeysOptions {
    pub limit: Option<usize>,
    pub exclusive_start_key: Option<String>,
    pub desc: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyItem {
    pub key: String,
    pub size: u64,
}

/// One page of keys, with the remote API's listing envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyListing {
    pub count: usize,
    pub limit: usize,
    pub exclusive_start_key: Option<String>,
    pub is_truncated: bool,
    pub next_exclusive_start_key: Option<String>,
    pub items: Vec<KeyItem>,
}
