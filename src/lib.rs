//! localstash: local key-value storage emulation
//!
//! A filesystem-backed stand-in for a remote key-value storage API, so
//! client code written against the remote API can run unmodified against a
//! local directory tree:
//! - Key-Value Store Engine (one directory per store, one file per record)
//! - Connection Cache (one embedded-database handle per file path)
//! - Content-type / extension mapping and API-compatible pagination

pub mod body;
pub mod content_type;
pub mod error;
pub mod storage;
pub mod validation;

pub use error::{Result, StorageError};
// Export the store engine and connection surface consumed by resource clients
pub use storage::{
    ConnectionCache, ConnectionOptions, GetRecordOptions, KeyItem, KeyListing, KeyValueStore,
    ListKeysOptions, NewRecord, Record, RecordPayload, RecordValue, SharedConnection,
    StoreMetadata, DEFAULT_LIST_KEYS_LIMIT,
};
