//! Component trait - the capability set a widget type implements.
//!
//! A component is plain data plus hooks. There is no inheritance: a component
//! that extends another one wraps it and calls the wrapped hooks explicitly.
//!
//! ```ignore
//! struct Base;
//! impl Component for Base {
//!     fn template(&self) -> Option<Rc<dyn Template>> { Some(base_template()) }
//!     fn create(&self, widget: &Widget) -> Result<()> { widget.set("ready", true).map(|_| ()) }
//! }
//!
//! struct Fancy { base: Base }
//! impl Component for Fancy {
//!     fn template(&self) -> Option<Rc<dyn Template>> { self.base.template() }
//!     fn create(&self, widget: &Widget) -> Result<()> {
//!         self.base.create(widget)?; // the "parent" implementation
//!         widget.set("fancy", true).map(|_| ())
//!     }
//! }
//! ```
//!
//! Hooks take `&self`: they may run re-entrantly (a hook can `set` attributes,
//! which can update the widget, which runs hooks). Components that keep
//! mutable state use `Cell`/`RefCell` fields.

use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use super::Widget;
use crate::error::Result;
use crate::renderer::{NodeHandle, Template};
use crate::types::Attributes;

/// Result of the initialization hook.
pub enum InitOutcome {
    /// Initialization finished; `inited` fires immediately.
    Ready,
    /// Initialization continues; `inited` fires when the future resolves.
    Pending(LocalBoxFuture<'static, Result<()>>),
}

impl InitOutcome {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<()>> + 'static,
    {
        InitOutcome::Pending(future.boxed_local())
    }
}

impl std::fmt::Debug for InitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitOutcome::Ready => f.write_str("Ready"),
            InitOutcome::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// A widget type.
pub trait Component: 'static {
    /// Name used in logs and errors.
    fn display_name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        // `a::Wrapper<b::Inner>` -> `Wrapper`
        let path = full.split('<').next().unwrap_or(full);
        path.rsplit("::").next().unwrap_or(path)
    }

    /// The render template. Constructing a widget without one fails.
    fn template(&self) -> Option<Rc<dyn Template>> {
        None
    }

    /// Default attributes, overridden by caller-supplied ones.
    fn defaults(&self) -> Attributes {
        Attributes::new()
    }

    /// Runs once at the end of construction.
    fn init(&self, _widget: &Widget) -> Result<InitOutcome> {
        Ok(InitOutcome::Ready)
    }

    /// Runs after the first render.
    fn create(&self, _widget: &Widget) -> Result<()> {
        Ok(())
    }

    /// Runs before every re-render.
    fn before_update(
        &self,
        _widget: &Widget,
        _prev: Option<&Widget>,
        _dom: Option<&NodeHandle>,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs after every re-render.
    fn update(
        &self,
        _widget: &Widget,
        _prev: Option<&Widget>,
        _dom: Option<&NodeHandle>,
    ) -> Result<()> {
        Ok(())
    }

    /// Runs after every nested widget has been destroyed.
    fn destroy(&self, _widget: &Widget, _dom: Option<&NodeHandle>) -> Result<()> {
        Ok(())
    }
}
