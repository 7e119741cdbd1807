//! Blackboard coordination: hint posting, reading, waiting and subscribing.
//!
//! Agents coordinate by posting small keyed hints instead of messaging each
//! other. A post is written to the [`HintStore`] first and only then
//! announced on the [`EventBus`] as `blackboard:hint-posted`, so anyone who
//! hears about a hint can also read it back.
//!
//! Waiters and subscribers listen for that announcement and filter it by
//! key pattern. One-shot waits resolve at most once and always deregister
//! their listener, whether they match, time out, fail or are dropped.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::blackboard::hint::{Hint, HintDraft};
use crate::blackboard::pattern::{to_matcher, to_store_wildcard, HintPattern};
use crate::events::{EventBus, EventPayload, ListenerId};
use crate::memory::storage::HintStore;
use crate::utilities::config::FleetConfig;
use crate::utilities::errors::StoreError;
use crate::utilities::logger::FleetLogger;

/// Event type announcing a stored hint. Its data is the posted [`HintDraft`].
pub const HINT_POSTED_EVENT: &str = "blackboard:hint-posted";

/// Source recorded on hint notifications.
pub const BLACKBOARD_SOURCE: &str = "blackboard";

/// Entry point for blackboard operations.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use aqe_fleet::blackboard::{BlackboardCoordinator, HintDraft};
/// use aqe_fleet::events::EventBus;
/// use aqe_fleet::memory::InMemoryHintStore;
/// use aqe_fleet::utilities::logger::LogFacade;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// runtime.block_on(async {
///     let logger = Arc::new(LogFacade::default());
///     let bus = Arc::new(EventBus::new(logger.clone()));
///     let blackboard = BlackboardCoordinator::new(bus, Arc::new(InMemoryHintStore::new()), logger);
///
///     blackboard
///         .post_hint(HintDraft::new("aqe/coverage/module-a", serde_json::json!({"lines": 87})))
///         .await
///         .unwrap();
///
///     let hint = blackboard
///         .wait_for_hint("aqe/coverage/*", Some(Duration::from_millis(50)))
///         .await
///         .unwrap();
///     assert_eq!(hint.unwrap().value["lines"], 87);
/// });
/// ```
pub struct BlackboardCoordinator {
    bus: Arc<EventBus>,
    store: Arc<dyn HintStore>,
    logger: Arc<dyn FleetLogger>,
    default_timeout: Duration,
}

impl fmt::Debug for BlackboardCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlackboardCoordinator")
            .field("bus", &self.bus)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

impl BlackboardCoordinator {
    /// Create a coordinator with the default wait timeout (30 s).
    pub fn new(bus: Arc<EventBus>, store: Arc<dyn HintStore>, logger: Arc<dyn FleetLogger>) -> Self {
        Self {
            bus,
            store,
            logger,
            default_timeout: FleetConfig::default().hint_wait_timeout(),
        }
    }

    /// Build a coordinator whose default wait timeout comes from `config`.
    pub fn with_config(
        config: &FleetConfig,
        bus: Arc<EventBus>,
        store: Arc<dyn HintStore>,
        logger: Arc<dyn FleetLogger>,
    ) -> Self {
        Self::new(bus, store, logger).with_default_timeout(config.hint_wait_timeout())
    }

    /// Replace the timeout used when `wait_for_hint` gets `None`.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Timeout applied when `wait_for_hint` gets `None`.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Store a hint, then announce it.
    ///
    /// Nothing is emitted when the store write fails. Keys containing a NUL
    /// character are refused with [`StoreError::InvalidKey`] before the write.
    pub async fn post_hint(&self, draft: HintDraft) -> Result<(), StoreError> {
        StoreError::check_key(&draft.key)?;
        let data = serde_json::to_value(&draft)?;

        if let Err(e) = self.store.post(&draft).await {
            self.logger.error(
                &format!("Failed to post hint: {}", draft.key),
                Some(&json!({ "error": e.to_string() })),
            );
            return Err(e);
        }

        self.bus.emit(HINT_POSTED_EVENT, BLACKBOARD_SOURCE, data, None);
        Ok(())
    }

    /// Stored, unexpired hints whose key matches `pattern`, in store order.
    pub async fn read_hints(&self, pattern: &str) -> Result<Vec<Hint>, StoreError> {
        self.store.query(&to_store_wildcard(pattern)).await
    }

    /// Wait for a hint whose key matches `pattern`.
    ///
    /// Returns the first stored match right away if there is one. Otherwise
    /// waits for a matching post until `timeout` (the coordinator default
    /// when `None`) and returns `Ok(None)` if none arrives. A store failure
    /// during the initial check is returned as `Err`.
    pub async fn wait_for_hint(
        &self,
        pattern: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<Hint>, StoreError> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let matcher = to_matcher(pattern);
        let (tx, rx) = oneshot::channel::<Hint>();
        let sender = Arc::new(Mutex::new(Some(tx)));

        // Armed before the store check so a post racing the check is not lost.
        let id = {
            let sender = Arc::clone(&sender);
            self.listen(matcher.clone(), move |hint| {
                if let Some(tx) = sender.lock().take() {
                    let _ = tx.send(hint);
                }
            })
        };
        let _guard = ListenerGuard {
            bus: Arc::clone(&self.bus),
            id,
        };

        if let Some(hint) = self.store.query(matcher.store_form()).await?.into_iter().next() {
            return Ok(Some(hint));
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(hint)) => Ok(Some(hint)),
            Ok(Err(_)) => Ok(None),
            Err(_) => {
                self.logger.debug(
                    &format!("Timed out waiting for hint: {}", pattern),
                    Some(&json!({ "timeoutMs": timeout.as_millis() as u64 })),
                );
                Ok(None)
            }
        }
    }

    /// Call `callback` for every future hint whose key matches `pattern`.
    ///
    /// Stays active until [`HintSubscription::dispose`] is called.
    pub fn subscribe_to_hints<F>(&self, pattern: &str, callback: F) -> HintSubscription
    where
        F: Fn(Hint) + Send + Sync + 'static,
    {
        let matcher = to_matcher(pattern);
        let id = self.listen(matcher.clone(), callback);
        HintSubscription {
            bus: Arc::clone(&self.bus),
            id,
            pattern: matcher,
            active: AtomicBool::new(true),
        }
    }

    fn listen<F>(&self, matcher: HintPattern, on_match: F) -> ListenerId
    where
        F: Fn(Hint) + Send + Sync + 'static,
    {
        let logger = Arc::clone(&self.logger);
        self.bus.on(HINT_POSTED_EVENT, move |payload: &EventPayload| {
            let Some(draft) = decode_draft(&payload.data) else {
                logger.warn(
                    "Ignoring malformed hint notification",
                    Some(&json!({ "eventId": payload.event_id })),
                );
                return;
            };
            if matcher.matches(&draft.key) {
                on_match(draft.materialize(Utc::now()));
            }
        })
    }
}

fn decode_draft(data: &Value) -> Option<HintDraft> {
    serde_json::from_value(data.clone()).ok()
}

/// Removes a one-shot wait listener however the wait ends.
struct ListenerGuard {
    bus: Arc<EventBus>,
    id: ListenerId,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.bus.off(HINT_POSTED_EVENT, &self.id);
    }
}

/// Handle to a standing hint subscription.
///
/// Dropping the handle does not unsubscribe; call [`dispose`](Self::dispose).
#[must_use = "the subscription stays active until dispose() is called"]
pub struct HintSubscription {
    bus: Arc<EventBus>,
    id: ListenerId,
    pattern: HintPattern,
    active: AtomicBool,
}

impl HintSubscription {
    /// Stop delivering hints. Returns `true` only on the first call.
    pub fn dispose(&self) -> bool {
        if !self.active.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.bus.off(HINT_POSTED_EVENT, &self.id);
        true
    }

    /// `false` once [`dispose`](Self::dispose) has run.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// The pattern as passed to `subscribe_to_hints`.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl fmt::Debug for HintSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HintSubscription")
            .field("id", &self.id)
            .field("pattern", &self.pattern.as_str())
            .field("active", &self.is_active())
            .finish()
    }
}
