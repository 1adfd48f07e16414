//! Canonical hashing
//!
//! Values are reduced to a canonical JSON form before digesting:
//! - Object keys sorted by Unicode code point, recursively
//! - Arrays keep their order
//! - Compact output (no insignificant whitespace)
//!
//! The digest is SHA-256, rendered as 64 lowercase hex characters. Key order
//! is established here, independent of serde_json's `preserve_order` feature.

use crate::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Canonical bytes of any serializable value
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    let canonical = canonicalize(value);
    Ok(serde_json::to_vec(&canonical)?)
}

/// Canonical hash (hex SHA-256) of any serializable value
pub fn hash<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bytes = canonical_bytes(value)?;
    Ok(hash_bytes(&bytes))
}

/// Hex SHA-256 of raw bytes
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
