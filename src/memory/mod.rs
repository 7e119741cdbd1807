//! Durable state for the fleet.
//!
//! Hints posted to the blackboard are owned by a [`HintStore`]. Two
//! backends ship with the crate: a process-local [`InMemoryHintStore`] and
//! a file-backed [`SqliteHintStore`].

pub mod storage;

pub use storage::{HintStore, InMemoryHintStore, SqliteHintStore};
