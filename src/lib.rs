//! # aqe-fleet
//!
//! Coordination layer for a fleet of quality-engineering agents.
//!
//! Two in-process services let agents cooperate without talking to each
//! other directly:
//!
//! - an [`EventBus`] that records fleet lifecycle events, writes the
//!   standard log line for well-known event types and fans each event out
//!   to registered listeners;
//! - a [`BlackboardCoordinator`] through which agents post keyed hints to a
//!   [`HintStore`], read them back by wildcard pattern, wait for one to
//!   appear or subscribe to future matches.

pub mod blackboard;
pub mod events;
pub mod memory;
pub mod utilities;

pub use blackboard::{BlackboardCoordinator, Hint, HintDraft, HintPattern, HintSubscription};
pub use events::{EventBus, EventPayload, FleetEvent, ListenerId};
pub use memory::{HintStore, InMemoryHintStore, SqliteHintStore};
pub use utilities::{FleetConfig, FleetLogger, LogFacade, StoreError};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
