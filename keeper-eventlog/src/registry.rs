use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::dispatcher::HandlerContext;
use crate::event::TrackedEvent;
use crate::kind::EventKind;
use crate::outcome::DeliveryOutcome;

pub type HandlerFuture = Pin<Box<dyn Future<Output = DeliveryOutcome> + Send + 'static>>;

pub type EventHandler = fn(HandlerContext, TrackedEvent) -> HandlerFuture;

/// Explicit `EventKind -> handler` table. At most one handler per kind.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    bindings: HashMap<EventKind, EventHandler>,
}

impl HandlerRegistry {
    /// Bind `handler` to `kind`. Refuses to replace an existing binding.
    pub fn bind(&mut self, kind: EventKind, handler: EventHandler) -> bool {
        if self.bindings.contains_key(&kind) {
            warn!(%kind, "handler already bound; unbind first");
            return false;
        }

        self.bindings.insert(kind, handler);
        true
    }

    /// Drop every binding and return how many were removed.
    pub fn unbind_all(&mut self) -> usize {
        let removed = self.bindings.len();
        self.bindings.clear();
        removed
    }

    pub fn bind_all(&mut self, handlers: impl IntoIterator<Item = (EventKind, EventHandler)>) {
        for (kind, handler) in handlers {
            self.bind(kind, handler);
        }
    }

    pub fn handler(&self, kind: EventKind) -> Option<EventHandler> {
        self.bindings.get(&kind).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
