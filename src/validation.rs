// FILE: src/validation.rs
//! Input shape validation, applied before any I/O happens.

use crate::error::{Result, StorageError};

pub fn record_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StorageError::Validation(
            "record key must be a non-empty string".into(),
        ));
    }
    if key.chars().any(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(StorageError::Validation(format!(
            "record key {key:?} must not contain path separators"
        )));
    }
    Ok(())
}

pub fn store_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StorageError::Validation(
            "store name must be a non-empty string".into(),
        ));
    }
    if name.chars().any(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(StorageError::Validation(format!(
            "store name {name:?} must not contain path separators"
        )));
    }
    Ok(())
}

pub fn limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(StorageError::Validation(
            "limit must be a positive number".into(),
        ));
    }
    Ok(())
}

pub fn content_type(content_type: &str) -> Result<()> {
    if content_type.trim().is_empty() {
        return Err(StorageError::Validation(
            "content type must be a non-empty string".into(),
        ));
    }
    Ok(())
}
