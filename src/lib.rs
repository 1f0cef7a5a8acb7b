//! # spark-widgets
//!
//! Attribute-driven widget core for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for fine-grained reactivity.
//!
//! ## Architecture
//!
//! A widget is a component instance whose observable state is a map of named
//! attributes. Setting attributes emits change events; the aggregate `change`
//! event drives a re-render through a per-widget renderer created from the
//! component's template.
//!
//! ```text
//! set(attrs) → change:<attr>… → beforeChange → change → UpdateCoordinator → Renderer::update
//! ```
//!
//! Rendering itself is outside this crate. A template is anything that can
//! create a [`Renderer`]; [`TreeTemplate`] is a small closure-backed one.
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use spark_widgets::{attrs, Component, ContextRegistry, Template, TreeTemplate, VNode, Widget};
//!
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn template(&self) -> Option<Rc<dyn Template>> {
//!         Some(Rc::new(TreeTemplate::new(|widget| {
//!             let count = widget.get("count").and_then(|v| v.as_f64()).unwrap_or_default();
//!             Ok(VNode::element("span", vec![VNode::text(count.to_string())]))
//!         })))
//!     }
//! }
//!
//! let context = ContextRegistry::new();
//! let counter = Widget::new(Counter, attrs! { "count" => 0 }, &context)?;
//! counter.init()?;
//! counter.set("count", 1)?;
//! assert!(counter.is_rendered());
//! # Ok::<(), spark_widgets::WidgetError>(())
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Attribute values, attribute maps, callbacks
//! - [`engine`] - Context registry, scheduler, update coordinator
//! - [`state`] - Attribute store and event bus
//! - [`renderer`] - Template/renderer contract and tree teardown
//! - [`widget`] - The widget handle and its lifecycle

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod renderer;
pub mod state;
pub mod types;
pub mod widget;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use types::{Attributes, Callback, Value};

pub use error::{Result, WidgetError};

pub use config::{WidgetConfig, EVENT_PREFIX};

pub use engine::{run_until_idle, ContextRegistry, TaskHandle, UpdateCoordinator};

pub use state::{EventBus, SetFlags, SetOptions};

pub use renderer::{NodeHandle, Renderer, Template, TreeTemplate, VNode};

pub use widget::{Component, InitOutcome, LifecycleState, Widget, WidgetBuilder};
