//! Central fan-out bus for fleet events.
//!
//! [`EventBus`] owns its listener registry and a bounded log of recent
//! events. `emit` records the event, writes the built-in log line for
//! well-known types, then calls every listener registered for the type in
//! registration order.
//!
//! ## Rules
//! - **Synchronous dispatch**: sync listeners run on the emitting thread,
//!   one after another, before `emit` returns.
//! - **Fire and forget**: async listeners are spawned on the current Tokio
//!   runtime and never awaited by the emitter.
//! - **Isolation**: a panicking listener is caught and logged; the remaining
//!   listeners still run and `emit` still returns the event id.
//! - **Snapshot iteration**: dispatch works on a copy of the listener list,
//!   so listeners may register or deregister while an emission is running.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};

use crate::events::builtin_handlers::log_builtin;
use crate::events::fleet_event::{EventPayload, FleetEvent};
use crate::utilities::config::{FleetConfig, DEFAULT_EVENT_LOG_CAPACITY, DEFAULT_MAX_LISTENERS};
use crate::utilities::logger::{FleetLogger, LogFacade};

/// A listener invoked inline during `emit`.
pub type SyncListener = Arc<dyn Fn(&EventPayload) + Send + Sync>;

/// A listener whose returned future is spawned and not awaited.
pub type AsyncListener = Arc<dyn Fn(EventPayload) -> BoxFuture<'static, ()> + Send + Sync>;

static LISTENER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Handle identifying one registration, used with [`EventBus::off`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(LISTENER_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value, as written to log fields.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

#[derive(Clone)]
enum Listener {
    Sync(SyncListener),
    Async(AsyncListener),
}

#[derive(Clone)]
struct ListenerEntry {
    id: ListenerId,
    listener: Listener,
}

/// Id-addressable log of the most recent events.
///
/// `order` is only touched under its mutex, which also serializes insertion
/// into `events` so eviction always removes the oldest id.
struct EventLog {
    events: DashMap<String, FleetEvent>,
    order: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl EventLog {
    fn new(capacity: usize) -> Self {
        Self {
            events: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    fn insert(&self, event: FleetEvent) {
        let mut order = self.order.lock();
        order.push_back(event.id.clone());
        self.events.insert(event.id.clone(), event);
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.events.remove(&oldest);
            }
        }
    }

    fn get(&self, id: &str) -> Option<FleetEvent> {
        self.events.get(id).map(|e| e.value().clone())
    }

    fn len(&self) -> usize {
        self.events.len()
    }
}

/// In-process event bus shared by the fleet.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<ListenerEntry>>>,
    log: EventLog,
    max_listeners: AtomicUsize,
    /// Types already reported as exceeding the listener ceiling.
    leak_warned: Mutex<HashSet<String>>,
    initialized: AtomicBool,
    logger: Arc<dyn FleetLogger>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Arc::new(LogFacade::new("aqe_fleet::events")))
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.listeners.read().len())
            .field("events", &self.log.len())
            .field("max_listeners", &self.max_listeners())
            .finish()
    }
}

impl EventBus {
    /// Create a bus with the default listener ceiling and log capacity.
    pub fn new(logger: Arc<dyn FleetLogger>) -> Self {
        Self::build(DEFAULT_MAX_LISTENERS, DEFAULT_EVENT_LOG_CAPACITY, logger)
    }

    /// Create a bus sized by `config`.
    pub fn with_config(config: &FleetConfig, logger: Arc<dyn FleetLogger>) -> Self {
        Self::build(config.max_listeners, config.event_log_capacity, logger)
    }

    fn build(max_listeners: usize, event_log_capacity: usize, logger: Arc<dyn FleetLogger>) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            log: EventLog::new(event_log_capacity),
            max_listeners: AtomicUsize::new(max_listeners),
            leak_warned: Mutex::new(HashSet::new()),
            initialized: AtomicBool::new(false),
            logger,
        }
    }

    /// Mark the bus ready. Only the first call logs anything.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        self.logger.info("Initializing EventBus", None);
        self.logger.info("EventBus initialized successfully", None);
    }

    /// Whether [`initialize`](Self::initialize) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// The logger receiving built-in lines and listener faults.
    pub fn logger(&self) -> &Arc<dyn FleetLogger> {
        &self.logger
    }

    // -----------------------------------------------------------------------
    // Emission
    // -----------------------------------------------------------------------

    /// Emit a fleet event and return its id.
    ///
    /// The event is recorded before any listener runs, so listeners can
    /// look it up with [`get_event`](Self::get_event).
    pub fn emit(&self, event_type: &str, source: &str, data: Value, target: Option<&str>) -> String {
        let event = FleetEvent::new(event_type, source, data, target.map(str::to_string));
        let id = event.id.clone();
        let payload = event.payload();
        self.log.insert(event);

        self.logger.debug(
            &format!("Event emitted: {} from {}", event_type, source),
            Some(&json!({
                "eventId": id,
                "target": payload.target,
                "data": payload.data,
            })),
        );
        log_builtin(self.logger.as_ref(), event_type, &payload.data);

        self.dispatch(event_type, &payload);
        id
    }

    fn dispatch(&self, event_type: &str, payload: &EventPayload) {
        let snapshot: Vec<ListenerEntry> = {
            let map = self.listeners.read();
            match map.get(event_type) {
                Some(entries) => entries.clone(),
                None => return,
            }
        };

        for entry in snapshot {
            match entry.listener {
                Listener::Sync(listener) => {
                    let result = std::panic::catch_unwind(AssertUnwindSafe(|| listener(payload)));
                    if let Err(panic) = result {
                        self.report_listener_fault(event_type, entry.id, &panic_message(&*panic));
                    }
                }
                Listener::Async(listener) => self.spawn_async(event_type, entry.id, &listener, payload),
            }
        }
    }

    fn spawn_async(
        &self,
        event_type: &str,
        id: ListenerId,
        listener: &AsyncListener,
        payload: &EventPayload,
    ) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                self.logger.warn(
                    &format!("No async runtime; skipped async listener for {}", event_type),
                    Some(&json!({ "listenerId": id.as_u64() })),
                );
                return;
            }
        };

        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| listener(payload.clone()))) {
            Ok(fut) => fut,
            Err(panic) => {
                self.report_listener_fault(event_type, id, &panic_message(&*panic));
                return;
            }
        };

        let logger = Arc::clone(&self.logger);
        let event_type = event_type.to_string();
        handle.spawn(async move {
            if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
                logger.error(
                    &format!("Error in event listener for {}", event_type),
                    Some(&json!({
                        "listenerId": id.as_u64(),
                        "error": panic_message(&*panic),
                    })),
                );
            }
        });
    }

    fn report_listener_fault(&self, event_type: &str, id: ListenerId, message: &str) {
        self.logger.error(
            &format!("Error in event listener for {}", event_type),
            Some(&json!({
                "listenerId": id.as_u64(),
                "error": message,
            })),
        );
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Look up a recorded event. Empty or unknown ids return `None`.
    pub fn get_event(&self, id: &str) -> Option<FleetEvent> {
        if id.is_empty() {
            return None;
        }
        self.log.get(id)
    }

    /// Number of events currently addressable.
    pub fn event_count(&self) -> usize {
        self.log.len()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register a listener called inline for every `event_type` emission.
    pub fn on<F>(&self, event_type: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.register(event_type.into(), Listener::Sync(Arc::new(listener)))
    }

    /// Register a listener whose future is spawned per emission.
    pub fn on_async<F, Fut>(&self, event_type: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(EventPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener: AsyncListener = Arc::new(move |payload| listener(payload).boxed());
        self.register(event_type.into(), Listener::Async(listener))
    }

    fn register(&self, event_type: String, listener: Listener) -> ListenerId {
        let id = ListenerId::next();
        let count = {
            let mut map = self.listeners.write();
            let entries = map.entry(event_type.clone()).or_default();
            entries.push(ListenerEntry { id, listener });
            entries.len()
        };

        let max = self.max_listeners();
        if count > max && self.leak_warned.lock().insert(event_type.clone()) {
            self.logger.warn(
                &format!(
                    "Possible EventBus listener leak detected: {} listeners added for {} (max {})",
                    count, event_type, max
                ),
                None,
            );
        }
        id
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub fn off(&self, event_type: &str, id: &ListenerId) -> bool {
        let mut map = self.listeners.write();
        let Some(entries) = map.get_mut(event_type) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != *id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            map.remove(event_type);
        }
        removed
    }

    /// Remove every listener for `event_type`, or for all types with `None`.
    pub fn remove_all_listeners(&self, event_type: Option<&str>) {
        let mut map = self.listeners.write();
        match event_type {
            Some(t) => {
                map.remove(t);
            }
            None => map.clear(),
        }
    }

    /// Listeners currently registered for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners.read().get(event_type).map_or(0, Vec::len)
    }

    /// Listener ceiling per event type before a leak warning is logged.
    pub fn max_listeners(&self) -> usize {
        self.max_listeners.load(Ordering::Relaxed)
    }

    /// Change the per-type ceiling. Existing registrations are kept.
    pub fn set_max_listeners(&self, max: usize) {
        self.max_listeners.store(max, Ordering::Relaxed);
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
