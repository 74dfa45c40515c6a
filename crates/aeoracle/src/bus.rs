//! Typed publish/subscribe for connection events.
//!
//! Subscribers register either a synchronous handler for one [`EventKind`] or
//! an unbounded stream of every [`OracleEvent`]. Dispatch works on a snapshot
//! of the subscriber list, so a handler may register further handlers; those
//! only see later events. A panicking handler is logged and skipped; the
//! remaining subscribers still receive the event.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use aeoracle_core::event::{EventKind, OracleEvent};

type Handler = Arc<dyn Fn(&OracleEvent) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    handlers: HashMap<EventKind, Vec<Handler>>,
    streams: Vec<mpsc::UnboundedSender<OracleEvent>>,
}

/// Shared subscription registry.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Call `handler` for every event of `kind`.
    ///
    /// Handlers run on the connection's driver task and should return
    /// quickly. A handler that panics is caught and logged.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&OracleEvent) + Send + Sync + 'static,
    {
        self.lock()
            .handlers
            .entry(kind)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Receive every event from now on. Dropping the receiver unsubscribes.
    pub fn events(&self) -> mpsc::UnboundedReceiver<OracleEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().streams.push(tx);
        rx
    }

    /// Deliver `event` to handlers of its kind, then to every stream.
    pub fn emit(&self, event: &OracleEvent) {
        let (handlers, streams) = {
            let mut subs = self.lock();
            subs.streams.retain(|tx| !tx.is_closed());
            (
                subs.handlers
                    .get(&event.kind())
                    .cloned()
                    .unwrap_or_default(),
                subs.streams.clone(),
            )
        };

        tracing::trace!(event = %event.kind(), handlers = handlers.len(), "dispatching event");
        for handler in handlers {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                tracing::error!(event = %event.kind(), "event handler panicked");
            }
        }
        for tx in streams {
            let _ = tx.send(event.clone());
        }
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.lock().handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Number of live event streams.
    pub fn stream_count(&self) -> usize {
        let mut subs = self.lock();
        subs.streams.retain(|tx| !tx.is_closed());
        subs.streams.len()
    }
}
