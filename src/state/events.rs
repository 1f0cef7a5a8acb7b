//! Event Bus - per-widget named callback registry.
//!
//! # API
//!
//! - `on(name, cb)` - Append a callback (no de-duplication)
//! - `off_all()` / `off(name)` / `off_callback(name, cb)` - Remove registrations
//! - `trigger(name, args)` - Invoke callbacks in registration order
//!
//! Callbacks are compared by identity, so removing a callback removes every
//! registration of that exact [`Callback`] and nothing else.
//!
//! # Re-entrancy
//!
//! `trigger` snapshots the callback list before invoking anything, so a
//! callback may freely register or remove callbacks (including itself). The
//! changes apply to the next `trigger`.
//!
//! # Example
//!
//! ```ignore
//! let bus = EventBus::new();
//! let log = Callback::handler(|args| { println!("{args:?}"); Ok(()) });
//!
//! bus.on("select", log.clone()).on("select", log.clone());
//! bus.trigger("select", &[Value::from(1)])?; // prints twice
//! bus.off_callback("select", &log);
//! bus.trigger("select", &[])?;               // prints nothing
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::{Callback, Value};

/// Named callback registry.
#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<HashMap<String, Vec<Callback>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `callback` to the list registered under `name`.
    pub fn on(&self, name: impl Into<String>, callback: Callback) -> &Self {
        self.handlers
            .borrow_mut()
            .entry(name.into())
            .or_default()
            .push(callback);
        self
    }

    /// Remove every registration.
    pub fn off_all(&self) -> &Self {
        self.handlers.borrow_mut().clear();
        self
    }

    /// Remove the whole list registered under `name`.
    pub fn off(&self, name: &str) -> &Self {
        self.handlers.borrow_mut().remove(name);
        self
    }

    /// Remove every registration of `callback` under `name`, keeping the
    /// order of the survivors.
    pub fn off_callback(&self, name: &str, callback: &Callback) -> &Self {
        if let Some(callbacks) = self.handlers.borrow_mut().get_mut(name) {
            callbacks.retain(|cb| !cb.ptr_eq(callback));
        }
        self
    }

    /// Invoke every callback registered under `name`, in registration order.
    ///
    /// The first error stops dispatch and is returned to the caller.
    pub fn trigger(&self, name: &str, args: &[Value]) -> Result<&Self> {
        let callbacks = match self.handlers.borrow().get(name) {
            Some(callbacks) if !callbacks.is_empty() => callbacks.clone(),
            _ => return Ok(self),
        };
        tracing::trace!(event = name, handlers = callbacks.len(), "trigger");
        for callback in &callbacks {
            callback.call(args)?;
        }
        Ok(self)
    }

    /// Number of callbacks registered under `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.handlers.borrow().get(name).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, name: &str) -> bool {
        self.listener_count(name) > 0
    }

    /// Names with at least one registration.
    pub fn event_names(&self) -> Vec<String> {
        self.handlers
            .borrow()
            .iter()
            .filter(|(_, callbacks)| !callbacks.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.borrow();
        let mut map = f.debug_map();
        for (name, callbacks) in handlers.iter() {
            map.entry(name, &callbacks.len());
        }
        map.finish()
    }
}
