//! Fleet event bus.
//!
//! This module provides the in-process publish/subscribe layer that lets
//! fleet components:
//! - Emit lifecycle events (`fleet:*`, `agent:*`, `task:*`, `blackboard:*`)
//! - Look up recent events by id
//! - React to events through sync or async listeners

// ---------------------------------------------------------------------------
// Core infrastructure modules
// ---------------------------------------------------------------------------

/// Event record and listener payload.
pub mod fleet_event;

/// Listener registry, dispatch and the bounded event log.
pub mod event_bus;

/// Fixed log lines for well-known event types.
pub mod builtin_handlers;

// ---------------------------------------------------------------------------
// Convenience re-exports
// ---------------------------------------------------------------------------

pub use builtin_handlers::{builtin_log_line, log_builtin, BuiltinLogLine};
pub use event_bus::{AsyncListener, EventBus, ListenerId, SyncListener};
pub use fleet_event::{EventPayload, FleetEvent};
