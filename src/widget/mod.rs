//! Widgets - attribute-driven component instances.
//!
//! A [`Widget`] is a cheap, clonable handle. It bundles:
//! - an [`AttributeStore`] with change detection
//! - an [`EventBus`] for `change:*`, `beforeChange`, `change`, `rendered`, `inited`
//!   and any `ev-*` attribute handlers
//! - an [`UpdateCoordinator`] that turns aggregate `change` events into updates
//! - the per-instance [`Renderer`] created from the component's template
//! - its place in the parent's [`ContextRegistry`] and its own child registry
//!
//! # Construction
//!
//! ```text
//! defaults ⊕ attributes          (caller wins, assigned silently)
//!   → splice `arguments`
//!   → wire `ev-*` callables onto the bus
//!   → hoist `children`
//!   → register in the parent context
//!   → init hook (may be async; gates `inited`)
//! ```
//!
//! # Setting attributes
//!
//! For `set` touching `{a, b}` in that order the event order is
//! `change:a, change:b, beforeChange, change`. Values equal to the stored
//! ones are ignored; if nothing changed nothing fires at all.

mod component;
mod lifecycle;

pub use component::{Component, InitOutcome};
pub use lifecycle::LifecycleState;

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use spark_signals::{signal, Signal};

use crate::config::{self, WidgetConfig, EVENT_PREFIX};
use crate::engine::coordinator::UpdateCoordinator;
use crate::engine::registry::ContextRegistry;
use crate::engine::scheduler::{self, TaskHandle};
use crate::error::{Result, WidgetError};
use crate::renderer::{NodeHandle, Renderer};
use crate::state::attributes::{AttributeStore, SetOptions, ARGUMENTS, CHILDREN};
use crate::state::events::EventBus;
use crate::types::{Attributes, Callback, Value};

/// Attribute naming the instance id.
pub const WIDGET_ID: &str = "widget";

/// Attribute holding the stable identity key.
pub const KEY: &str = "key";

thread_local! {
    /// Counter for generated instance ids.
    static ID_COUNTER: Cell<usize> = const { Cell::new(0) };
}

fn next_instance_id(prefix: &str) -> String {
    ID_COUNTER.with(|counter| {
        let id = counter.get();
        counter.set(id + 1);
        format!("{prefix}{id}")
    })
}

/// Reset the generated id counter (for testing).
pub fn reset_ids() {
    ID_COUNTER.with(|counter| counter.set(0));
}

// =============================================================================
// Widget
// =============================================================================

pub(crate) struct WidgetInner {
    component: Rc<dyn Component>,
    display_name: String,
    instance_id: String,
    key: Option<Value>,
    config: WidgetConfig,

    store: AttributeStore,
    events: EventBus,
    coordinator: UpdateCoordinator,
    /// Scheduled async aggregate `change`.
    pending_change: RefCell<Option<TaskHandle>>,

    renderer: RefCell<Box<dyn Renderer>>,
    element: RefCell<Option<NodeHandle>>,
    prev_widget: RefCell<Option<Weak<WidgetInner>>>,

    /// Registry this widget is registered in (its parent's).
    context: ContextRegistry,
    /// Registry the widgets rendered by this one register in.
    widgets: ContextRegistry,

    state: Cell<LifecycleState>,
    lifecycle: Signal<LifecycleState>,
    inited: Cell<bool>,
    rendered: Cell<bool>,
    create_called: Cell<bool>,
    destroying: Cell<bool>,
    /// A renderer call is on the stack.
    rendering: Cell<bool>,
    /// An aggregate change arrived mid-render outside any drain.
    deferred_change: Cell<bool>,
}

/// Handle to a widget instance.
#[derive(Clone)]
pub struct Widget(Rc<WidgetInner>);

/// Builder for widgets that need more than [`Widget::new`] offers.
pub struct WidgetBuilder {
    component: Rc<dyn Component>,
    attributes: Attributes,
    context: Option<ContextRegistry>,
    config: Option<WidgetConfig>,
}

impl WidgetBuilder {
    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Context to register in. A fresh root context is used if omitted.
    pub fn context(mut self, context: &ContextRegistry) -> Self {
        self.context = Some(context.clone());
        self
    }

    /// Override the thread-local configuration for this widget.
    pub fn config(mut self, config: WidgetConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<Widget> {
        let context = self.context.unwrap_or_default();
        let config = self.config.unwrap_or_else(config::config);
        Widget::construct(self.component, self.attributes, context, config)
    }
}

impl Widget {
    /// Construct a widget registered in `context`.
    pub fn new<C: Component>(
        component: C,
        attributes: Attributes,
        context: &ContextRegistry,
    ) -> Result<Widget> {
        Self::builder(component)
            .attributes(attributes)
            .context(context)
            .build()
    }

    pub fn builder<C: Component>(component: C) -> WidgetBuilder {
        WidgetBuilder {
            component: Rc::new(component),
            attributes: Attributes::new(),
            context: None,
            config: None,
        }
    }

    fn construct(
        component: Rc<dyn Component>,
        attributes: Attributes,
        context: ContextRegistry,
        config: WidgetConfig,
    ) -> Result<Widget> {
        let display_name = component.display_name().to_string();
        let Some(template) = component.template() else {
            return Err(WidgetError::MissingTemplate { widget: display_name });
        };

        let mut merged = Attributes::new();
        merged.insert(CHILDREN.to_string(), Value::Null);
        merged.extend(component.defaults());
        merged.extend(attributes);

        let key = merged.get(KEY).filter(|v| !v.is_null()).cloned();
        let instance_id = match merged.get(WIDGET_ID).and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => next_instance_id(&config.id_prefix),
        };

        let store = AttributeStore::new();
        store.apply(merged);

        if let Some(arguments) = store.remove(ARGUMENTS) {
            store.extend(arguments.resolve_map(&instance_id)?);
        }

        let coordinator = UpdateCoordinator::new(instance_id.clone(), config.max_recursive_updates);
        let widget = Widget(Rc::new(WidgetInner {
            component: component.clone(),
            display_name,
            instance_id,
            key,
            config,
            store,
            events: EventBus::new(),
            coordinator,
            pending_change: RefCell::new(None),
            renderer: RefCell::new(template.instantiate()),
            element: RefCell::new(None),
            prev_widget: RefCell::new(None),
            context,
            widgets: ContextRegistry::new(),
            state: Cell::new(LifecycleState::Constructed),
            lifecycle: signal(LifecycleState::Constructed),
            inited: Cell::new(false),
            rendered: Cell::new(false),
            create_called: Cell::new(false),
            destroying: Cell::new(false),
            rendering: Cell::new(false),
            deferred_change: Cell::new(false),
        }));

        widget.add_events();
        widget.0.store.hoist_children();
        widget.0.context.register(&widget);

        tracing::debug!(
            widget = %widget.instance_id(),
            component = %widget.display_name(),
            "widget constructed"
        );

        match component.init(&widget)? {
            InitOutcome::Ready => widget.mark_inited()?,
            InitOutcome::Pending(future) => {
                let pending = widget.clone();
                scheduler::spawn_local(async move {
                    future.await?;
                    pending.mark_inited()
                });
            }
        }

        Ok(widget)
    }

    fn mark_inited(&self) -> Result<()> {
        self.0.inited.set(true);
        self.trigger("inited", &[Value::Widget(self.clone())])?;
        Ok(())
    }

    pub(crate) fn from_inner(inner: Rc<WidgetInner>) -> Self {
        Widget(inner)
    }

    pub(crate) fn inner(&self) -> &Rc<WidgetInner> {
        &self.0
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Widget) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    pub fn instance_id(&self) -> &str {
        &self.0.instance_id
    }

    pub fn key(&self) -> Option<&Value> {
        self.0.key.as_ref()
    }

    pub fn display_name(&self) -> &str {
        &self.0.display_name
    }

    pub fn component(&self) -> &Rc<dyn Component> {
        &self.0.component
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.0.config
    }

    /// The registry this widget is registered in.
    pub fn context(&self) -> &ContextRegistry {
        &self.0.context
    }

    /// The registry for widgets rendered inside this one.
    pub fn widgets(&self) -> &ContextRegistry {
        &self.0.widgets
    }

    /// The widget this one replaced in its last update, if still alive.
    pub fn prev_widget(&self) -> Option<Widget> {
        self.0
            .prev_widget
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Widget)
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Live view of the attribute mapping. Mutate through `set` only.
    pub fn attributes(&self) -> Ref<'_, Attributes> {
        self.0.store.all()
    }

    /// Current value of `key`. `children` falls back to the hoisted sub-tree.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.store.get(key)
    }

    /// The sub-tree hoisted out of the `children` attribute.
    pub fn children(&self) -> Value {
        self.0.store.children()
    }

    /// Set one attribute with default options.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<&Self> {
        let mut input = Attributes::new();
        input.insert(key.into(), value.into());
        self.set_with(input, SetOptions::default())
    }

    /// Set many attributes with default options.
    pub fn set_many(&self, input: Attributes) -> Result<&Self> {
        self.set_with(input, SetOptions::default())
    }

    /// Set attributes and emit events according to `options`.
    pub fn set_with(&self, input: Attributes, options: SetOptions) -> Result<&Self> {
        if input.is_empty() {
            return Ok(self);
        }
        let changes = self.0.store.apply(input);
        if changes.is_empty() {
            return Ok(self);
        }
        tracing::trace!(widget = %self.instance_id(), ?changes, "attributes changed");

        let this = Value::Widget(self.clone());
        let silent = options.is_silent();
        for attr in &changes {
            let value = self.0.store.all().get(attr).cloned().unwrap_or_default();
            if let Some(callback) = options.attr_callbacks.get(attr) {
                callback.call(&[this.clone(), value.clone()])?;
            }
            if !silent {
                self.trigger(&format!("change:{attr}"), &[this.clone(), value])?;
            }
        }
        if let Some(callback) = &options.change_callback {
            callback.call(&[this.clone()])?;
        }
        if silent {
            return Ok(self);
        }

        self.trigger("beforeChange", &[this])?;
        if options.is_global() {
            if let Some(task) = self.0.pending_change.borrow_mut().take() {
                task.cancel();
            }
            if options.is_async() {
                self.schedule_change();
            } else {
                self.emit_change()?;
            }
        }
        Ok(self)
    }

    fn schedule_change(&self) {
        let weak = Rc::downgrade(&self.0);
        let task = scheduler::schedule(move || match weak.upgrade() {
            Some(inner) => {
                let widget = Widget(inner);
                widget.0.pending_change.borrow_mut().take();
                widget.emit_change()
            }
            None => Ok(()),
        });
        *self.0.pending_change.borrow_mut() = Some(task);
    }

    /// True while an async aggregate `change` is scheduled.
    pub fn has_pending_change(&self) -> bool {
        self.0
            .pending_change
            .borrow()
            .as_ref()
            .is_some_and(TaskHandle::is_pending)
    }

    /// Emit the aggregate `change` event through the update coordinator.
    fn emit_change(&self) -> Result<()> {
        if self.is_destroyed() {
            return Ok(());
        }
        if self.0.rendering.get() && !self.0.coordinator.is_draining() {
            self.0.deferred_change.set(true);
            return Ok(());
        }
        self.0
            .coordinator
            .request(|| {
                self.trigger("change", &[Value::Widget(self.clone())])?;
                self.patch(None, None)?;
                self.flush_deferred_change()
            })
            .map(|_| ())
    }

    fn flush_deferred_change(&self) -> Result<()> {
        if self.0.deferred_change.replace(false) {
            self.emit_change()?;
        }
        Ok(())
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn events(&self) -> &EventBus {
        &self.0.events
    }

    pub fn on(&self, name: impl Into<String>, callback: Callback) -> &Self {
        self.0.events.on(name, callback);
        self
    }

    pub fn off_all(&self) -> &Self {
        self.0.events.off_all();
        self
    }

    pub fn off(&self, name: &str) -> &Self {
        self.0.events.off(name);
        self
    }

    pub fn off_callback(&self, name: &str, callback: &Callback) -> &Self {
        self.0.events.off_callback(name, callback);
        self
    }

    pub fn trigger(&self, name: &str, args: &[Value]) -> Result<&Self> {
        self.0.events.trigger(name, args)?;
        Ok(self)
    }

    /// Subscribe every `ev-<name>` callable attribute to `<name>`.
    pub fn add_events(&self) -> &Self {
        for (attr, callback) in self.0.store.callables_with_prefix(EVENT_PREFIX) {
            self.0.events.on(&attr[EVENT_PREFIX.len()..], callback);
        }
        self
    }

    /// Subscribe the `ev-<name>` callables found in `attributes`.
    pub fn add_events_from(&self, attributes: &Attributes) -> &Self {
        for (attr, value) in attributes {
            if let (Some(name), Some(callback)) = (attr.strip_prefix(EVENT_PREFIX), value.as_callback()) {
                self.0.events.on(name, callback.clone());
            }
        }
        self
    }

    /// Unsubscribe every `ev-*` callable attribute and delete those attributes.
    pub fn remove_events(&self) -> &Self {
        for (attr, callback) in self.0.store.callables_with_prefix(EVENT_PREFIX) {
            self.0.events.off_callback(&attr[EVENT_PREFIX.len()..], &callback);
            self.0.store.remove(&attr);
        }
        self
    }
}

impl PartialEq for Widget {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("component", &self.0.display_name)
            .field("id", &self.0.instance_id)
            .field("state", &self.0.state.get())
            .finish()
    }
}
