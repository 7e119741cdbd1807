//! Runtime configuration for the coordination layer.
//!
//! Values come from [`FleetConfig::default`] and can be overridden through
//! environment variables:
//!
//! - `AQE_MAX_LISTENERS`: listener ceiling per event type (default 1000)
//! - `AQE_EVENT_LOG_CAPACITY`: events retained for `get_event` (default 10000)
//! - `AQE_HINT_WAIT_TIMEOUT_MS`: default `wait_for_hint` timeout (default 30000)
//! - `AQE_HINT_DB_PATH`: SQLite hint database path

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utilities::paths::default_hint_db_path;

/// Listener ceiling sized for a fleet of hundreds to low thousands of agents.
pub const DEFAULT_MAX_LISTENERS: usize = 1000;

/// Number of emitted events kept addressable by id.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 10_000;

/// Default `wait_for_hint` timeout in milliseconds.
pub const DEFAULT_HINT_WAIT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    pub max_listeners: usize,
    pub event_log_capacity: usize,
    pub hint_wait_timeout_ms: u64,
    /// `None` means [`default_hint_db_path`].
    pub hint_db_path: Option<PathBuf>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            hint_wait_timeout_ms: DEFAULT_HINT_WAIT_TIMEOUT_MS,
            hint_db_path: None,
        }
    }
}

impl FleetConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// Unparseable or zero numeric values keep the default and log a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            max_listeners: parse_positive(&lookup, "AQE_MAX_LISTENERS")
                .unwrap_or(defaults.max_listeners),
            event_log_capacity: parse_positive(&lookup, "AQE_EVENT_LOG_CAPACITY")
                .unwrap_or(defaults.event_log_capacity),
            hint_wait_timeout_ms: parse_positive(&lookup, "AQE_HINT_WAIT_TIMEOUT_MS")
                .unwrap_or(defaults.hint_wait_timeout_ms),
            hint_db_path: lookup("AQE_HINT_DB_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn hint_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.hint_wait_timeout_ms)
    }

    pub fn resolved_hint_db_path(&self) -> PathBuf {
        self.hint_db_path
            .clone()
            .unwrap_or_else(default_hint_db_path)
    }
}

fn parse_positive<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + Default,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(v) if v != T::default() => Some(v),
        _ => {
            log::warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}
