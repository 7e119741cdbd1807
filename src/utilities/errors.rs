//! Error types for the coordination layer.
//!
//! Only the hint store can fail. Listener faults are contained by the bus,
//! and lookup misses and wait timeouts are `None`, never errors.

use thiserror::Error;

/// Errors raised by a [`HintStore`](crate::memory::storage::HintStore).
///
/// The coordinator returns these to its caller unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected the operation.
    #[error("Hint store database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database location could not be prepared.
    #[error("Hint store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The hint key cannot be stored and matched consistently.
    #[error("Invalid hint key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// A hint value could not be encoded or decoded.
    #[error("Hint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The blocking worker running a store call died.
    #[error("Hint store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Failure reported by a third-party store backend.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Reject keys the store would read differently from the live matcher.
    ///
    /// SQLite's `LIKE` stops at a NUL character, so such keys are refused.
    pub fn check_key(key: &str) -> Result<(), StoreError> {
        if key.contains('\0') {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: "contains a NUL character",
            });
        }
        Ok(())
    }

    /// Wrap a backend failure message.
    pub fn backend(message: impl std::fmt::Display) -> Self {
        StoreError::Backend(anyhow::anyhow!("{}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_message_is_transparent() {
        let err = StoreError::backend("disk full");
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_check_key_rejects_nul() {
        assert!(StoreError::check_key("aqe/result/42").is_ok());
        assert!(StoreError::check_key("").is_ok());

        let err = StoreError::check_key("a\0b").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
        assert!(err.to_string().contains("NUL"));
    }

    #[test]
    fn test_serialization_error_converts() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StoreError = bad.into();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(err.to_string().starts_with("Hint serialization error"));
    }
}
