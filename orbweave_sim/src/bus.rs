// Note event bus.
//
// Decouples "a note was triggered" from everything that reacts to it. The
// sequencer publishes; the orb field and each chain follower subscribe once
// at construction time and live for the rest of the performance.
//
// Dispatch is synchronous and ordered: `publish` calls every handler in
// subscription order before returning. Handlers receive `&mut S` (the
// simulation stage) rather than capturing shared mutable state, so a bus
// never needs interior mutability. A handler that returns an error or panics
// is isolated: the failure is logged and counted in the `DispatchReport`,
// and the remaining handlers still run.

use crate::error::HandlerError;
use crate::types::NoteEvent;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

pub type HandlerResult = Result<(), HandlerError>;

type BoxedHandler<S> = Box<dyn FnMut(&mut S, &NoteEvent) -> HandlerResult>;

/// Handle returned by `subscribe`, usable with `unsubscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscriber<S> {
    id: SubscriptionId,
    handler: BoxedHandler<S>,
}

/// Outcome of one `publish` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers called (every subscriber, exactly once).
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

pub struct EventBus<S> {
    subscribers: Vec<Subscriber<S>>,
    next_id: u64,
}

impl<S> Default for EventBus<S> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }
}

impl<S> EventBus<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It will be called after every handler registered
    /// before it.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut S, &NoteEvent) -> HandlerResult + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `event` to every subscriber in order.
    pub fn publish(&mut self, state: &mut S, event: &NoteEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        for sub in &mut self.subscribers {
            report.invoked += 1;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (sub.handler)(&mut *state, event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    report.failed += 1;
                    warn!(subscription = sub.id.0, note = %event.note, "{err}");
                }
                Err(payload) => {
                    report.failed += 1;
                    warn!(
                        subscription = sub.id.0,
                        note = %event.note,
                        "note handler panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
