//! Hint records exchanged through the blackboard.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What an agent posts: a key, an opaque value and an optional TTL.
///
/// This is also the payload of every `blackboard:hint-posted` notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintDraft {
    pub key: String,
    #[serde(default)]
    pub value: Value,
    /// Lifetime in seconds. Zero or absent means the hint never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl HintDraft {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl = Some(ttl_secs);
        self
    }

    /// Stamp the draft as observed at `now`.
    pub fn materialize(&self, now: DateTime<Utc>) -> Hint {
        Hint {
            key: self.key.clone(),
            value: self.value.clone(),
            ttl: self.ttl,
            created_at: now,
            expires_at: expiry(now, self.ttl),
        }
    }
}

/// A posted hint as seen by readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    /// Hierarchical `/`-separated key, e.g. `aqe/result/42`.
    pub key: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    pub created_at: DateTime<Utc>,
    /// Set iff `ttl` is positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Hint {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// `created_at + ttl`, saturating at the latest representable instant.
pub(crate) fn expiry(created_at: DateTime<Utc>, ttl: Option<u64>) -> Option<DateTime<Utc>> {
    let ttl = ttl.filter(|t| *t > 0)?;
    let at = i64::try_from(ttl)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| created_at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    Some(at)
}
