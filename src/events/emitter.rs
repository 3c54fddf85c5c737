//! Synchronous, ordered pub/sub for run lifecycle events.
//!
//! The emitter decouples the walker from whoever consumes its events
//! (reporters, metrics, tests). It is shared behind an `Arc` so that late
//! settlements arriving from other tasks can still report through it.

use super::event::{Event, EventKind};
use crate::error::{ArgPosition, EngineError, EngineResult, ProgrammerError, RegistrationResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A registered event callback.
///
/// Identity is the `Arc` allocation: registering the same `Handler` twice
/// stores it twice, and [`EventEmitter::off`] removes every copy.
pub type Handler = Arc<dyn Fn(&Event) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[derive(Default)]
pub struct EventEmitter {
    handlers: RwLock<HashMap<EventKind, Vec<Handler>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `kind`. Duplicates are not collapsed.
    pub fn on(&self, kind: EventKind, handler: Handler) {
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.entry(kind).or_default().push(handler);
        }
    }

    /// Register a closure and hand back its [`Handler`] so it can be removed later.
    pub fn subscribe<F>(&self, kind: EventKind, f: F) -> Handler
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let registered = handler(f);
        self.on(kind, registered.clone());
        registered
    }

    /// Register a handler by wire name (e.g. `"blockComplete"`).
    pub fn on_named(&self, name: &str, handler: Handler) -> RegistrationResult<()> {
        let kind = parse_event_name("on", name)?;
        self.on(kind, handler);
        Ok(())
    }

    /// Remove every registration of `handler` for `kind`. No-op if absent.
    pub fn off(&self, kind: EventKind, handler: &Handler) {
        if let Ok(mut handlers) = self.handlers.write() {
            if let Some(registered) = handlers.get_mut(&kind) {
                registered.retain(|h| !same_handler(h, handler));
                if registered.is_empty() {
                    handlers.remove(&kind);
                }
            }
        }
    }

    pub fn off_named(&self, name: &str, handler: &Handler) -> RegistrationResult<()> {
        let kind = parse_event_name("off", name)?;
        self.off(kind, handler);
        Ok(())
    }

    /// Invoke every handler registered for the event's kind, in registration order.
    ///
    /// The first handler error stops dispatch and is returned to the caller.
    pub fn emit(&self, event: &Event) -> EngineResult<()> {
        let kind = event.kind();

        // Snapshot so handlers may call on()/off() without deadlocking.
        let handlers: Vec<Handler> = match self.handlers.read() {
            Ok(handlers) => handlers.get(&kind).cloned().unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        for handler in handlers {
            handler(event).map_err(|source| EngineError::Handler {
                event: kind,
                source,
            })?;
        }

        Ok(())
    }

    /// Number of registrations currently held for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        if let Ok(handlers) = self.handlers.read() {
            handlers.get(&kind).map(Vec::len).unwrap_or(0)
        } else {
            0
        }
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(EventKind, usize)> = EventKind::ALL
            .into_iter()
            .map(|kind| (kind, self.handler_count(kind)))
            .filter(|(_, count)| *count > 0)
            .collect();

        f.debug_struct("EventEmitter")
            .field("handlers", &counts)
            .finish()
    }
}

fn parse_event_name(function: &'static str, name: &str) -> RegistrationResult<EventKind> {
    if name.is_empty() {
        return Err(ProgrammerError::invalid_argument(
            function,
            ArgPosition::First,
            "a non-empty string",
        ));
    }
    name.parse()
}

fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
