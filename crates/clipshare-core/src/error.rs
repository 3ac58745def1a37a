//! Error types for clipshare.

use thiserror::Error;

/// Result type alias using clipshare's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for clipshare operations.
///
/// Each variant is a distinct, terminal outcome for one request. Only
/// [`Error::Conflict`] is worth retrying, and that retry belongs to the
/// caller: nothing in the repository layer retries on its own.
#[derive(Error, Debug)]
pub enum Error {
    /// Collection absent or expired
    #[error("Collection not found: {0}")]
    NotFound(String),

    /// Item absent within an existing collection
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Stored record could not be deserialized
    #[error("Corrupted collection record: {0}")]
    Corrupted(String),

    /// Optimistic transaction lost the race against a concurrent writer
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Key-value store connection or configuration failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization failed on the write path
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether an outer caller may sensibly re-run the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("abc".to_string());
        assert_eq!(err.to_string(), "Collection not found: abc");
    }

    #[test]
    fn test_error_display_item_not_found() {
        let err = Error::ItemNotFound("item-1".to_string());
        assert_eq!(err.to_string(), "Item not found: item-1");
    }

    #[test]
    fn test_error_display_corrupted() {
        let err = Error::Corrupted("expected value at line 1".to_string());
        assert_eq!(
            err.to_string(),
            "Corrupted collection record: expected value at line 1"
        );
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("clip:abc".to_string());
        assert_eq!(err.to_string(), "Conflict: clip:abc");
    }

    #[test]
    fn test_error_display_store_unavailable() {
        let err = Error::StoreUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Store unavailable: connection refused");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("content must not be empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: content must not be empty");
    }

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(Error::Conflict("k".into()).is_retryable());
        assert!(!Error::NotFound("k".into()).is_retryable());
        assert!(!Error::ItemNotFound("k".into()).is_retryable());
        assert!(!Error::Corrupted("k".into()).is_retryable());
        assert!(!Error::StoreUnavailable("k".into()).is_retryable());
        assert!(!Error::InvalidInput("k".into()).is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
