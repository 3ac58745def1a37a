//! Identifier generation for collections and items.
//!
//! Collection ids double as capabilities: anyone holding the share URL can
//! read and write the collection, so they are drawn from a CSPRNG-backed
//! alphanumeric alphabet. Item ids only need to be unique within their
//! collection and use UUIDv7, which keeps them time-ordered in logs.

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::defaults::{COLLECTION_ID_LEN, COLLECTION_ID_MAX_LEN, COLLECTION_KEY_PREFIX};

/// Generate a fresh collection identifier.
///
/// # Example
///
/// ```
/// use clipshare_core::ids::{is_valid_collection_id, new_collection_id};
///
/// let id = new_collection_id();
/// assert_eq!(id.len(), 16);
/// assert!(is_valid_collection_id(&id));
/// ```
pub fn new_collection_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(COLLECTION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Generate a fresh item identifier (UUIDv7, hyphenated).
#[inline]
pub fn new_item_id() -> String {
    Uuid::now_v7().to_string()
}

/// Store key for a collection record.
///
/// ```
/// assert_eq!(clipshare_core::collection_key("abc"), "clip:abc");
/// ```
pub fn collection_key(collection_id: &str) -> String {
    format!("{}{}", COLLECTION_KEY_PREFIX, collection_id)
}

/// Check whether a caller-supplied collection id could name a record.
///
/// Accepts 1 to 64 characters from `[A-Za-z0-9_-]`. Anything else cannot
/// have been issued by [`new_collection_id`] and is treated as not found
/// without touching the store.
pub fn is_valid_collection_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= COLLECTION_ID_MAX_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
