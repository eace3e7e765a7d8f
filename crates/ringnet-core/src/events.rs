//! Explicit subscription registry for the event surface, keyed by event
//! name, in place of event-emitter inheritance.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tracing::error;

/// An event delivered to the embedder. `Connection`/`Message` carry the
/// reserved payload shapes; `Custom` carries an embedder-defined
/// `header.type` string.
#[derive(Debug, Clone)]
pub enum Event {
    /// The listener is up and discovery (if enabled) has started.
    Ready,
    /// The discovery queue transitioned from empty to non-empty.
    Discovering,
    /// The discovery queue drained.
    Discovered,
    /// A new inbound or outbound connection was opened, pre-trust.
    Request { remote_address: String },
    /// A connection completed the trust handshake.
    Connection {
        ring_signature: Vec<u8>,
        remote_address: String,
    },
    /// Any MESSAGE frame was received, regardless of its type.
    Message {
        message_type: String,
        body: serde_json::Value,
    },
    /// A MESSAGE whose `header.type` was a string not in the reserved set.
    Custom { name: String, body: serde_json::Value },
}

impl Event {
    /// The event name subscribers register against.
    pub fn name(&self) -> &str {
        match self {
            Event::Ready => "ready",
            Event::Discovering => "discovering",
            Event::Discovered => "discovered",
            Event::Request { .. } => "request",
            Event::Connection { .. } => "connection",
            Event::Message { .. } => "message",
            Event::Custom { name, .. } => name,
        }
    }
}

type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

/// Registry of embedder callbacks keyed by event name. `emit` isolates
/// each callback with [`panic::catch_unwind`] so one bad subscriber can't
/// take down the event loop.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<String, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an event name (one of the reserved names, or any
    /// embedder-chosen `header.type` string).
    pub fn on(&self, event_name: impl Into<String>, handler: impl Fn(&Event) + Send + Sync + 'static) {
        self.handlers
            .lock()
            .unwrap()
            .entry(event_name.into())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Dispatch `event` to every subscriber of its name.
    pub fn emit(&self, event: Event) {
        let name = event.name().to_string();
        let handlers = {
            let guard = self.handlers.lock().unwrap();
            guard.get(&name).cloned().unwrap_or_default()
        };
        for handler in handlers {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                error!(event = %name, "embedder event handler panicked; isolated from the event loop");
            }
        }
    }
}
