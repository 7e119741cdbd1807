//! Blackboard: indirect agent coordination through shared keyed hints.
//!
//! Agents post hints under hierarchical `/`-separated keys and discover
//! each other's work by key pattern instead of messaging directly.
//!
//! # Write Before Notify
//!
//! [`BlackboardCoordinator::post_hint`] persists the hint through the
//! [`HintStore`](crate::memory::storage::HintStore) before announcing it on
//! the event bus. Every waiter or subscriber that hears about a hint can
//! therefore read it back from the store.
//!
//! # Patterns
//!
//! `*` is the only wildcard and matches any run of characters, `/`
//! included. See [`pattern`] for the store and live renderings.

pub mod coordination;
pub mod hint;
pub mod pattern;

pub use coordination::{BlackboardCoordinator, HintSubscription, BLACKBOARD_SOURCE, HINT_POSTED_EVENT};
pub use hint::{Hint, HintDraft};
pub use pattern::{store_wildcard_matches, to_matcher, to_store_wildcard, HintPattern};
