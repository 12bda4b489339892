//! EventEmitter - the listener registry
//!
//! Maps event names to [`ListenerList`]s behind a single mutex. Mutations
//! hold the lock for their duration; `emit` holds it only long enough to
//! snapshot the list, so listener bodies may call back into the emitter.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticEntry, Diagnostics};
use crate::dispatch;
use crate::error::EmitterError;
use crate::event::Event;
use crate::list::ListenerList;
use crate::listener::{Handler, IntoHandler, ListenerId};
use crate::signature::{Args, BindArgs, Signature};
use crate::UNLIMITED_LISTENERS;

struct Shared {
    events: Mutex<HashMap<String, ListenerList>>,
    max_listeners: AtomicI64,
    diagnostics: Diagnostics,
}

/// In-process event emitter
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct EventEmitter {
    shared: Arc<Shared>,
}

impl EventEmitter {
    /// Create an emitter with default settings
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create an emitter from configuration
    pub fn with_config(config: &Config) -> Self {
        debug!(
            max_listeners = config.max_listeners,
            diagnostics_capacity = config.diagnostics_capacity,
            "EventEmitter::with_config"
        );
        Self {
            shared: Arc::new(Shared {
                events: Mutex::new(HashMap::new()),
                max_listeners: AtomicI64::new(config.max_listeners),
                diagnostics: Diagnostics::new(config.diagnostics_capacity),
            }),
        }
    }

    /// Register a listener for `event`
    ///
    /// The first listener of an event locks its signature; later listeners
    /// with a different arity or argument types are rejected and the list is
    /// left unchanged.
    pub fn on<A, M, L>(&self, event: impl AsRef<str>, listener: L) -> Result<&Self, EmitterError>
    where
        A: Args,
        L: IntoHandler<A, M>,
    {
        let event = event.as_ref();
        let handler = listener.into_handler();
        debug!(event, listener = handler.id(), "EventEmitter::on");
        let count = self
            .lock_events()
            .entry(event.to_string())
            .or_insert_with(|| ListenerList::new(event))
            .add(handler)?;
        self.check_max_listeners(event, count);
        Ok(self)
    }

    /// Same as [`on`](Self::on)
    pub fn add_listener<A, M, L>(
        &self,
        event: impl AsRef<str>,
        listener: L,
    ) -> Result<&Self, EmitterError>
    where
        A: Args,
        L: IntoHandler<A, M>,
    {
        self.on(event, listener)
    }

    /// Register a listener that removes itself after its first invocation
    ///
    /// The stored entry is a wrapper with its own identity, so passing the
    /// original handler to [`off`](Self::off) does not remove it.
    pub fn once<A, M, L>(&self, event: impl AsRef<str>, listener: L) -> Result<&Self, EmitterError>
    where
        A: Args,
        L: IntoHandler<A, M>,
    {
        let event = event.as_ref();
        let handler = listener.into_handler();
        debug!(event, listener = handler.id(), "EventEmitter::once");
        let detach = detacher(Arc::downgrade(&self.shared), event.to_string());
        let count = self
            .lock_events()
            .entry(event.to_string())
            .or_insert_with(|| ListenerList::new(event))
            .once(handler, detach)?;
        self.check_max_listeners(event, count);
        Ok(self)
    }

    /// Remove every registration of `listener` from `event`
    ///
    /// Unknown events and absent listeners are a no-op.
    pub fn off<A: Args>(&self, event: impl AsRef<str>, listener: &Handler<A>) -> &Self {
        let event = event.as_ref();
        debug!(event, listener = listener.id(), "EventEmitter::off");
        self.shared.remove(event, listener.id());
        self
    }

    /// Same as [`off`](Self::off)
    pub fn remove_listener<A: Args>(&self, event: impl AsRef<str>, listener: &Handler<A>) -> &Self {
        self.off(event, listener)
    }

    /// Remove every listener of every event
    pub fn remove_all_listeners(&self) -> &Self {
        let mut events = self.lock_events();
        debug!(events = events.len(), "EventEmitter::remove_all_listeners");
        for list in events.values_mut() {
            list.clear();
        }
        events.clear();
        self
    }

    /// Invoke every listener of `event` with `args` and wait for all of them
    ///
    /// Unknown events are a no-op. Listeners run in parallel; a listener
    /// that panics is logged and reported as a diagnostic, and never affects
    /// the other listeners or the caller. Fails without invoking anything if
    /// `args` does not match the event's signature.
    pub fn emit<A: Args>(&self, event: impl AsRef<str>, args: A) -> Result<&Self, EmitterError> {
        let event = event.as_ref();
        let handlers = {
            let events = self.lock_events();
            let Some(list) = events.get(event) else {
                debug!(event, "EventEmitter::emit: no listeners");
                return Ok(self);
            };
            list.snapshot::<A>()?
        };
        debug!(event, listeners = handlers.len(), "EventEmitter::emit");

        for failure in dispatch::fan_out(event, &handlers, &args) {
            error!(
                event,
                listener = failure.listener,
                message = %failure.message,
                "EventEmitter::emit: listener panicked"
            );
            self.shared.diagnostics.publish(Diagnostic::ListenerPanicked {
                event: event.to_string(),
                listener: failure.listener,
                message: failure.message,
            });
        }
        Ok(self)
    }

    /// Emit through a typed key, binding [`Nil`](crate::Nil) positions to their default
    pub fn emit_event<A, B>(&self, event: &Event<A>, args: B) -> Result<&Self, EmitterError>
    where
        A: Args,
        B: BindArgs<A>,
    {
        self.emit(event.name(), args.bind_args())
    }

    /// Set the warning threshold (-1 = unlimited); affects future registrations
    pub fn set_max_listeners(&self, max: i64) -> &Self {
        debug!(max, "EventEmitter::set_max_listeners");
        self.shared.max_listeners.store(max, Ordering::Relaxed);
        self
    }

    pub fn max_listeners(&self) -> i64 {
        self.shared.max_listeners.load(Ordering::Relaxed)
    }

    /// Number of listeners registered for `event` (0 if unknown)
    pub fn listener_count(&self, event: impl AsRef<str>) -> usize {
        self.lock_events().get(event.as_ref()).map_or(0, ListenerList::len)
    }

    /// Names of all events with listeners, sorted
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock_events().keys().cloned().collect();
        names.sort();
        names
    }

    /// Locked signature of `event`, if it has listeners
    pub fn signature(&self, event: impl AsRef<str>) -> Option<Signature> {
        self.lock_events().get(event.as_ref()).and_then(|list| list.signature().cloned())
    }

    /// Subscribe to diagnostics raised after this call
    pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<DiagnosticEntry> {
        debug!("EventEmitter::subscribe_diagnostics: new subscriber");
        self.shared.diagnostics.subscribe()
    }

    /// Number of live diagnostics subscribers
    pub fn diagnostics_subscriber_count(&self) -> usize {
        self.shared.diagnostics.subscriber_count()
    }

    fn lock_events(&self) -> MutexGuard<'_, HashMap<String, ListenerList>> {
        self.shared.lock_events()
    }

    fn check_max_listeners(&self, event: &str, count: usize) {
        let max = self.max_listeners();
        if max == UNLIMITED_LISTENERS || i64::try_from(count).unwrap_or(i64::MAX) < max {
            return;
        }
        let diagnostic = Diagnostic::MaxListenersExceeded {
            event: event.to_string(),
            count,
            max_listeners: max,
        };
        warn!(event, count, max, "{}", diagnostic);
        self.shared.diagnostics.publish(diagnostic);
    }
}

/// Callback a once-wrapper uses to remove itself from `event`
fn detacher(shared: Weak<Shared>, event: String) -> impl Fn(ListenerId) + Send + Sync + 'static {
    move |id| {
        if let Some(shared) = shared.upgrade() {
            debug!(event = %event, listener = id, "EventEmitter: once listener detaching");
            shared.remove(&event, id);
        }
    }
}

impl Shared {
    fn lock_events(&self) -> MutexGuard<'_, HashMap<String, ListenerList>> {
        // Listener code never runs under this lock; a poisoned map is still consistent
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove `id` from `event`, pruning the event once its list drains
    fn remove(&self, event: &str, id: ListenerId) -> usize {
        let mut events = self.lock_events();
        let Some(list) = events.get_mut(event) else {
            return 0;
        };
        let removed = list.remove(id);
        if removed > 0 && list.is_empty() {
            debug!(event, "EventEmitter: pruning empty event");
            events.remove(event);
        }
        removed
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.event_names())
            .field("max_listeners", &self.max_listeners())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Nil;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::broadcast::error::TryRecvError;

    fn counter() -> (Arc<AtomicUsize>, Handler<()>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&calls);
        let handler = Handler::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (calls, handler)
    }

    #[test]
    fn test_unknown_event_has_no_listeners() {
        let emitter = EventEmitter::new();
        assert_eq!(emitter.listener_count("nothing"), 0);
        assert!(emitter.signature("nothing").is_none());
        assert!(emitter.event_names().is_empty());
    }

    #[test]
    fn test_on_and_emit() {
        let emitter = EventEmitter::new();
        let (calls, handler) = counter();

        emitter.on("test", handler).unwrap().emit("test", ()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count("test"), 1);
    }

    #[test]
    fn test_emit_unknown_event_is_noop() {
        let emitter = EventEmitter::new();
        assert!(emitter.emit("missing", (1, 2, 3)).is_ok());
    }

    #[test]
    fn test_emit_with_wrong_args_invokes_nothing() {
        let emitter = EventEmitter::new();
        let (calls, handler) = counter();
        emitter.on("test", handler).unwrap();

        let err = emitter.emit("test", (1,)).unwrap_err();
        assert!(err.is_arity_mismatch());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_off_prunes_event_and_resets_signature() {
        let emitter = EventEmitter::new();
        let handler = Handler::new(|_: i32| {});
        emitter.on("test", handler.clone()).unwrap();
        emitter.off("test", &handler);

        assert_eq!(emitter.listener_count("test"), 0);
        assert!(emitter.event_names().is_empty());
        // A fresh list may lock a different signature
        assert!(emitter.on("test", |_: String| {}).is_ok());
    }

    #[test]
    fn test_off_unknown_is_noop() {
        let emitter = EventEmitter::new();
        let (_, handler) = counter();
        emitter.off("missing", &handler);

        emitter.on("test", || {}).unwrap();
        emitter.off("test", &handler);
        assert_eq!(emitter.listener_count("test"), 1);
    }

    #[test]
    fn test_once_detaches_after_emit() {
        let emitter = EventEmitter::new();
        let (calls, handler) = counter();
        emitter.once("test", handler).unwrap();
        assert_eq!(emitter.listener_count("test"), 1);

        emitter.emit("test", ()).unwrap().emit("test", ()).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(emitter.listener_count("test"), 0);
    }

    #[test]
    fn test_max_listeners_warning() {
        let emitter = EventEmitter::new();
        emitter.set_max_listeners(2);
        let mut rx = emitter.subscribe_diagnostics();

        emitter.on("test", || {}).unwrap();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        emitter.on("test", || {}).unwrap();
        let entry = rx.try_recv().unwrap();
        assert_eq!(
            entry.diagnostic,
            Diagnostic::MaxListenersExceeded {
                event: "test".to_string(),
                count: 2,
                max_listeners: 2,
            }
        );
        assert_eq!(emitter.listener_count("test"), 2);
    }

    #[test]
    fn test_unlimited_listeners_never_warn() {
        let emitter = EventEmitter::new();
        emitter.set_max_listeners(UNLIMITED_LISTENERS);
        let mut rx = emitter.subscribe_diagnostics();

        for _ in 0..20 {
            emitter.on("test", || {}).unwrap();
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(emitter.listener_count("test"), 20);
    }

    #[test]
    fn test_emit_event_binds_nil() {
        const TEST: Event<(Option<String>, i32)> = Event::new("test");
        let emitter = EventEmitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        emitter
            .on(&TEST, move |err: Option<String>, n: i32| {
                sink.lock().unwrap().push((err, n));
            })
            .unwrap();

        emitter.emit_event(&TEST, (Nil, 5)).unwrap();
        emitter.emit_event(&TEST, (Some("bad".to_string()), Nil)).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![(None, 5), (Some("bad".to_string()), 0)]);
    }

    #[test]
    fn test_config_sets_threshold() {
        let config = Config {
            max_listeners: UNLIMITED_LISTENERS,
            ..Config::default()
        };
        let emitter = EventEmitter::with_config(&config);
        assert_eq!(emitter.max_listeners(), -1);
    }
}
