//! Developer console event log
//!
//! Keeps a bounded, newest-first history of completed requests and
//! republishes the whole history to every subscriber on each change.

pub mod console;
pub mod event;

pub use event::{DiagnosticEvent, Method};

use indexmap::IndexMap;
use std::any::Any;
use std::cell::Cell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Once, Weak};

/// Maximum number of events retained by an [`EventLog`]
pub const CAPACITY: usize = 200;

type Callback = Box<dyn Fn(&[DiagnosticEvent]) + Send + Sync>;

/// A registered callback and the version of the last snapshot it was given.
///
/// Delivery to one subscriber is serialized, and a snapshot older than the
/// one it already saw is dropped, so concurrent appends never leave a
/// subscriber on a stale view.
struct Subscriber {
    callback: Callback,
    delivered: Mutex<Option<u64>>,
}

impl Subscriber {
    fn deliver(&self, version: u64, snapshot: &[DiagnosticEvent]) {
        let mut delivered = lock(&self.delivered);
        if delivered.is_some_and(|seen| seen >= version) {
            return;
        }
        *delivered = Some(version);

        install_quiet_hook();
        let outer = QUIET_PANICS.replace(true);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(snapshot)));
        QUIET_PANICS.set(outer);

        if let Err(payload) = outcome {
            log::warn!(
                "devlog subscriber panicked ({}); continuing with remaining subscribers",
                panic_message(payload.as_ref())
            );
        }
    }
}

#[derive(Default)]
struct Inner {
    events: VecDeque<DiagnosticEvent>,
    subscribers: IndexMap<u64, Arc<Subscriber>>,
    next_token: u64,
    version: u64,
}

/// Bounded, observable log of request-completion records
pub struct EventLog {
    inner: Arc<Mutex<Inner>>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                events: VecDeque::with_capacity(capacity),
                ..Inner::default()
            })),
            capacity,
        }
    }

    /// Record an event and notify subscribers with the new snapshot.
    ///
    /// Callbacks must not append to the log that is notifying them.
    pub fn append(&self, event: DiagnosticEvent) {
        let (version, snapshot, subscribers) = {
            let mut inner = lock(&self.inner);
            inner.events.push_front(event);
            inner.events.truncate(self.capacity);
            inner.version += 1;
            (inner.version, snapshot_of(&inner), subscribers_of(&inner))
        };
        for subscriber in &subscribers {
            subscriber.deliver(version, &snapshot);
        }
    }

    /// Register a callback; it is invoked right away with the current snapshot
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[DiagnosticEvent]) + Send + Sync + 'static,
    {
        let subscriber = Arc::new(Subscriber {
            callback: Box::new(callback),
            delivered: Mutex::new(None),
        });
        let (token, version, snapshot) = {
            let mut inner = lock(&self.inner);
            let token = inner.next_token;
            inner.next_token += 1;
            inner.subscribers.insert(token, Arc::clone(&subscriber));
            (token, inner.version, snapshot_of(&inner))
        };
        log::debug!("devlog subscriber {} registered", token);

        subscriber.deliver(version, &snapshot);

        Subscription {
            log: Arc::downgrade(&self.inner),
            token,
        }
    }

    /// Newest-first copy of the recorded events
    pub fn current(&self) -> Vec<DiagnosticEvent> {
        snapshot_of(&lock(&self.inner))
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).events.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).events.is_empty()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

/// Disposer returned by [`EventLog::subscribe`]
pub struct Subscription {
    log: Weak<Mutex<Inner>>,
    token: u64,
}

impl Subscription {
    /// Remove the callback. Safe to call more than once, and from inside the
    /// callback itself.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.log.upgrade()
            && lock(&inner).subscribers.shift_remove(&self.token).is_some()
        {
            log::debug!("devlog subscriber {} removed", self.token);
        }
    }
}

// A subscriber that panicked must not poison the log for everyone else.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn snapshot_of(inner: &Inner) -> Vec<DiagnosticEvent> {
    inner.events.iter().cloned().collect()
}

fn subscribers_of(inner: &Inner) -> Vec<Arc<Subscriber>> {
    inner.subscribers.values().cloned().collect()
}

thread_local! {
    /// Set while this thread runs a subscriber callback
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the panic hook so panics caught from subscribers are reported through
/// the log instead of being printed over command output.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.get() {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload")
}
