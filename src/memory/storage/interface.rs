//! Storage interface for blackboard hints.

use async_trait::async_trait;

use crate::blackboard::hint::{Hint, HintDraft};
use crate::utilities::errors::StoreError;

/// Durable owner of posted hints.
///
/// Every hint backend implements this trait. The blackboard coordinator
/// only talks to the store through it.
#[async_trait]
pub trait HintStore: Send + Sync {
    /// Persist a hint.
    ///
    /// The hint's `created_at` is the instant the store accepts it; an
    /// `expires_at` follows from a positive `ttl`.
    async fn post(&self, hint: &HintDraft) -> Result<(), StoreError>;

    /// Return the unexpired hints whose key matches `store_pattern`.
    ///
    /// # Arguments
    /// * `store_pattern` - A pattern in store form, as produced by
    ///   [`to_store_wildcard`](crate::blackboard::pattern::to_store_wildcard):
    ///   `%` matches any run, `_` one character, `\` escapes the next one.
    ///
    /// # Returns
    /// Matching hints in insertion order.
    async fn query(&self, store_pattern: &str) -> Result<Vec<Hint>, StoreError>;
}
