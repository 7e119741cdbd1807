//! Storage backends for blackboard hints.

pub mod interface;
pub mod in_memory_hint_storage;
pub mod sqlite_hint_storage;

pub use interface::HintStore;
pub use in_memory_hint_storage::InMemoryHintStore;
pub use sqlite_hint_storage::SqliteHintStore;
