//! Persisted record codec.
//!
//! A collection is stored as one JSON blob. Decoding failures are reported
//! as [`Error::Corrupted`] so a truncated or foreign value under a `clip:`
//! key surfaces as a typed error instead of taking the request down.

use clipshare_core::{Error, Result, SharedClipCollection};

/// Serialize a collection record for storage.
pub fn encode(collection: &SharedClipCollection) -> Result<Vec<u8>> {
    serde_json::to_vec(collection).map_err(|e| Error::Serialization(e.to_string()))
}

/// Deserialize a stored collection record.
pub fn decode(bytes: &[u8]) -> Result<SharedClipCollection> {
    serde_json::from_slice(bytes).map_err(|e| Error::Corrupted(e.to_string()))
}
