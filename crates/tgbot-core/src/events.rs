//! Named-event listener registry.
//!
//! Handlers are registered with [`Listeners::on`] and invoked synchronously,
//! in registration order, by [`Listeners::emit`]. A panicking handler is
//! logged and skipped; it never unwinds into the caller.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use tracing::error;

/// Event emitted once per inbound update that carries a message.
pub const MESSAGE_EVENT: &str = "message";

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Cloneable handle to a shared registry; clones see the same handlers.
pub struct Listeners<T> {
    handlers: Arc<RwLock<HashMap<String, Vec<Handler<T>>>>>,
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
        }
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`.
    pub fn on<F>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut map = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        map.entry(event.into()).or_default().push(Arc::new(handler));
    }

    /// Invoke every handler registered for `event`. Returns how many ran.
    pub fn emit(&self, event: &str, payload: &T) -> usize {
        // Snapshot so handlers may register further listeners.
        let handlers: Vec<Handler<T>> = {
            let map = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            map.get(event).cloned().unwrap_or_default()
        };
        for (i, handler) in handlers.iter().enumerate() {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                error!(
                    "{event} handler #{i} panicked: {}",
                    panic_message(panic.as_ref())
                );
            }
        }
        handlers.len()
    }

    /// Number of handlers registered for `event`.
    pub fn count(&self, event: &str) -> usize {
        let map = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        map.get(event).map_or(0, Vec::len)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
