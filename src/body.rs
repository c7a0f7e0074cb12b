//! Record body parsing
//!
//! Turns raw record bytes into a decoded payload based on content type.
//! Invoked by the store engine only when neither raw-buffer nor raw-stream
//! mode is requested. Decoding failures degrade to the raw bytes instead of
//! erroring, so a corrupt body is still retrievable.

use crate::content_type;
use crate::storage::RecordPayload;

/// Decode `raw` according to `content_type`.
///
/// JSON content types parse into a [`serde_json::Value`], `text/*` decodes
/// as UTF-8, everything else stays a byte buffer.
pub fn parse(raw: Vec<u8>, content_type: &str) -> RecordPayload {
    if content_type::is_json(content_type) {
        return match serde_json::from_slice(&raw) {
            Ok(value) => RecordPayload::Json(value),
            Err(e) => {
                tracing::warn!("Record body is not valid JSON ({e}), returning raw bytes");
                RecordPayload::Bytes(raw)
            }
        };
    }

    if content_type::essence(content_type).starts_with("text/") {
        return match String::from_utf8(raw) {
            Ok(text) => RecordPayload::Text(text),
            Err(e) => {
                tracing::warn!("Record body is not valid UTF-8, returning raw bytes");
                RecordPayload::Bytes(e.into_bytes())
            }
        };
    }

    RecordPayload::Bytes(raw)
}
