//! Widget lifecycle - init, update and destroy.
//!
//! ```text
//! Constructed ──init()──► Initializing ──► Rendered ◄──► Updating
//!      │                                      │
//!      └──────────update() (replacement)──────┘
//!                                             │
//!                                   destroy() ▼
//!                                         Destroyed
//! ```
//!
//! `inited` is separate from this machine: it flips when the init hook (or
//! the future it returned) settles, independent of rendering.

use std::rc::Rc;

use super::Widget;
use crate::error::{Result, WidgetError};
use crate::renderer::{destroy_nested, NodeHandle};
use crate::types::Value;

/// Lifecycle state of a widget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Attributes assigned, nothing rendered.
    #[default]
    Constructed,
    /// Initial render in progress.
    Initializing,
    /// Rendered and idle.
    Rendered,
    /// Re-render in progress.
    Updating,
    /// Torn down. Terminal.
    Destroyed,
}

/// Clears the rendering flag even if the renderer fails.
struct RenderScope<'a>(&'a Widget);

impl<'a> RenderScope<'a> {
    fn enter(widget: &'a Widget) -> Self {
        widget.0.rendering.set(true);
        Self(widget)
    }
}

impl Drop for RenderScope<'_> {
    fn drop(&mut self) {
        self.0.0.rendering.set(false);
    }
}

impl Widget {
    // =========================================================================
    // State
    // =========================================================================

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.0.state.get()
    }

    /// Reactive view of the lifecycle state.
    ///
    /// Note: Reading it inside a derived/effect creates a dependency.
    pub fn lifecycle_signal(&self) -> spark_signals::Signal<LifecycleState> {
        self.0.lifecycle.clone()
    }

    fn transition(&self, state: LifecycleState) {
        let from = self.0.state.replace(state);
        if from != state {
            tracing::trace!(widget = %self.instance_id(), ?from, to = ?state, "lifecycle");
            self.0.lifecycle.set(state);
        }
    }

    pub fn is_inited(&self) -> bool {
        self.0.inited.get()
    }

    pub fn is_rendered(&self) -> bool {
        self.0.rendered.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.state.get() == LifecycleState::Destroyed
    }

    /// The node produced by the last render or update.
    pub fn element(&self) -> Option<NodeHandle> {
        self.0.element.borrow().clone()
    }

    /// True if the renderer holds a mounted node.
    pub fn has_node(&self) -> bool {
        // A renderer that is mid-render has not produced its node yet.
        self.0
            .renderer
            .try_borrow()
            .is_ok_and(|renderer| renderer.node().is_some())
    }

    /// The tree as last rendered.
    pub fn rendered_tree(&self) -> Option<crate::renderer::VNode> {
        self.0
            .renderer
            .try_borrow()
            .ok()
            .and_then(|renderer| renderer.tree())
    }

    // =========================================================================
    // Init
    // =========================================================================

    /// Render for the first time, then run the create hook.
    pub fn init(&self) -> Result<Option<NodeHandle>> {
        let element = self.init_inner(false)?;
        self.flush_deferred_change()?;
        Ok(element)
    }

    pub(super) fn init_inner(&self, from_update: bool) -> Result<Option<NodeHandle>> {
        if self.is_destroyed() {
            return Err(WidgetError::Destroyed {
                widget: self.instance_id().to_string(),
                operation: "init",
            });
        }

        if !from_update {
            let previous = self.lifecycle_state();
            self.transition(LifecycleState::Initializing);
            let rendered = {
                let _scope = RenderScope::enter(self);
                self.0.renderer.borrow_mut().render(self)
            };
            match rendered {
                Ok(node) => *self.0.element.borrow_mut() = Some(node),
                Err(err) => {
                    self.transition(previous);
                    return Err(err);
                }
            }
            tracing::debug!(widget = %self.instance_id(), "widget rendered");
        }

        self.0.rendered.set(true);
        self.0.create_called.set(true);
        self.transition(LifecycleState::Rendered);
        self.trigger("rendered", &[Value::Widget(self.clone())])?;
        self.0.component.create(self)?;
        Ok(self.element())
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Re-render the widget.
    ///
    /// With `prev` and `dom` both given, this widget takes over the position
    /// of `prev`: its renderer adopts `dom` and `prev`'s tree before patching.
    /// Returns `None` when neither widget has been mounted yet.
    pub fn update(&self, prev: Option<&Widget>, dom: Option<&NodeHandle>) -> Result<Option<NodeHandle>> {
        let element = self.patch(prev, dom)?;
        if !self.0.coordinator.is_draining() {
            self.flush_deferred_change()?;
        }
        Ok(element)
    }

    pub(super) fn patch(&self, prev: Option<&Widget>, dom: Option<&NodeHandle>) -> Result<Option<NodeHandle>> {
        if self.is_destroyed() {
            return Err(WidgetError::Destroyed {
                widget: self.instance_id().to_string(),
                operation: "update",
            });
        }
        if self.0.rendering.get() {
            // Asked to update from inside our own render.
            self.0.deferred_change.set(true);
            return Ok(None);
        }
        if !self.has_node() && !prev.is_some_and(Widget::has_node) {
            return Ok(None);
        }

        self.0.component.before_update(self, prev, dom)?;

        if let (Some(prev), Some(dom)) = (prev, dom) {
            if !prev.ptr_eq(self) {
                let tree = prev.rendered_tree();
                let mut renderer = self.0.renderer.borrow_mut();
                renderer.set_node(Some(dom.clone()));
                renderer.set_tree(tree);
                tracing::debug!(
                    widget = %self.instance_id(),
                    replaced = %prev.instance_id(),
                    "identity swap"
                );
            }
        }
        *self.0.prev_widget.borrow_mut() = prev.map(|p| Rc::downgrade(&p.0));

        let previous = self.lifecycle_state();
        self.transition(LifecycleState::Updating);
        let patched = {
            let _scope = RenderScope::enter(self);
            self.0.renderer.borrow_mut().update(self)
        };
        let element = match patched {
            Ok(node) => node,
            Err(err) => {
                self.transition(previous);
                return Err(err);
            }
        };
        *self.0.element.borrow_mut() = Some(element.clone());

        if self.0.create_called.get() {
            self.transition(LifecycleState::Rendered);
        } else {
            self.init_inner(true)?;
        }
        tracing::debug!(widget = %self.instance_id(), "widget updated");

        self.0.component.update(self, prev, dom)?;
        Ok(Some(element))
    }

    // =========================================================================
    // Destroy
    // =========================================================================

    /// Tear the widget down.
    ///
    /// Leaves the context registry (only if this instance still owns its id),
    /// drops every event subscription, destroys nested widgets depth-first,
    /// then runs the destroy hook. Destroying twice is a no-op.
    ///
    /// The widget ends up `Destroyed` even when teardown fails; the first
    /// error is returned after the transition.
    pub fn destroy(&self, dom: Option<&NodeHandle>) -> Result<()> {
        if self.is_destroyed() || self.0.destroying.replace(true) {
            tracing::trace!(widget = %self.instance_id(), "already destroyed");
            return Ok(());
        }

        let teardown = self.teardown(dom);

        self.transition(LifecycleState::Destroyed);
        self.0.element.borrow_mut().take();
        match &teardown {
            Ok(()) => tracing::debug!(widget = %self.instance_id(), "widget destroyed"),
            Err(err) => tracing::warn!(widget = %self.instance_id(), error = %err, "widget destroyed with errors"),
        }
        teardown
    }

    fn teardown(&self, dom: Option<&NodeHandle>) -> Result<()> {
        if !self.0.context.unregister(self) && self.0.context.contains(self.instance_id()) {
            tracing::warn!(
                widget = %self.instance_id(),
                "registry entry belongs to a newer instance; leaving it in place"
            );
        }

        if let Some(task) = self.0.pending_change.borrow_mut().take() {
            task.cancel();
        }
        self.0.events.off_all();

        let nested = match self.rendered_tree() {
            Some(tree) => destroy_nested(&tree),
            None => Ok(()),
        };
        let hook = self.0.component.destroy(self, dom);
        nested.and(hook)
    }
}
