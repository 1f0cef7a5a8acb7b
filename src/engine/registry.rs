//! Context Registry - instance id to widget mapping for a rendering context.
//!
//! Every widget owns one registry (its `widgets()`), and the widgets it renders
//! into its template register into that registry rather than their own.
//! Handles are cheap clones sharing the same map.
//!
//! - Entries are weak: the registry never keeps a widget alive on its own
//! - Removal is ownership-checked: only the instance currently registered
//!   under an id may remove it
//! - A ReactiveSet mirrors the registered ids, so deriveds that iterate over
//!   the context react to widgets being added or removed
//!
//! # Moved widgets
//!
//! When a widget moves inside the tree the replacement is created before the
//! old instance is destroyed. Both share the same id, so the late `destroy`
//! of the old instance must leave the new owner's entry in place.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use spark_signals::{batch, ReactiveSet};

use crate::widget::{Widget, WidgetInner};

struct RegistryInner {
    /// Instance id -> widget.
    entries: RefCell<IndexMap<String, Weak<WidgetInner>>>,
    /// Registered ids, reactive. Mutated inside `batch` so effects re-run
    /// only after the borrow is released.
    ids: RefCell<ReactiveSet<String>>,
}

/// Shared mapping from widget instance id to widget.
#[derive(Clone)]
pub struct ContextRegistry(Rc<RegistryInner>);

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self(Rc::new(RegistryInner {
            entries: RefCell::new(IndexMap::new()),
            ids: RefCell::new(ReactiveSet::new()),
        }))
    }

    /// Register `widget` under its instance id, replacing any previous owner.
    pub fn register(&self, widget: &Widget) {
        let id = widget.instance_id().to_string();
        let previous = self
            .0
            .entries
            .borrow_mut()
            .insert(id.clone(), Rc::downgrade(widget.inner()));
        if previous.is_some() {
            tracing::debug!(widget = %id, "registry entry taken over by new instance");
        }
        batch(|| {
            self.0.ids.borrow_mut().insert(id);
        });
    }

    /// Remove the entry for `widget`'s id, but only if `widget` still owns it.
    ///
    /// Returns true if the entry was removed.
    pub fn unregister(&self, widget: &Widget) -> bool {
        let id = widget.instance_id();
        let mut entries = self.0.entries.borrow_mut();
        let owned = entries
            .get(id)
            .is_some_and(|entry| Weak::ptr_eq(entry, &Rc::downgrade(widget.inner())));
        if !owned {
            return false;
        }
        entries.shift_remove(id);
        drop(entries);
        batch(|| {
            self.0.ids.borrow_mut().remove(id);
        });
        true
    }

    /// Look up a live widget by instance id.
    pub fn get(&self, id: &str) -> Option<Widget> {
        self.0
            .entries
            .borrow()
            .get(id)
            .and_then(Weak::upgrade)
            .map(Widget::from_inner)
    }

    /// Check whether `widget` is the current owner of its id.
    pub fn is_owner(&self, widget: &Widget) -> bool {
        self.get(widget.instance_id())
            .is_some_and(|current| current.ptr_eq(widget))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.ids.borrow().contains(id)
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.0.entries.borrow().keys().cloned().collect()
    }

    /// Registered ids, unordered.
    ///
    /// Note: This creates a reactive dependency when called from a derived/effect.
    pub fn watch_ids(&self) -> Vec<String> {
        self.0.ids.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identity comparison of two handles.
    pub fn ptr_eq(&self, other: &ContextRegistry) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("ids", &self.0.entries.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::testing::{reset_all, TestComponent};

    #[test]
    fn test_register_and_lookup() {
        reset_all();
        let context = ContextRegistry::new();
        let widget = Widget::new(TestComponent::new(), attrs! { "widget" => "w1" }, &context).unwrap();

        assert!(context.contains("w1"));
        assert_eq!(context.len(), 1);
        assert!(context.get("w1").unwrap().ptr_eq(&widget));
        assert_eq!(context.ids(), vec!["w1".to_string()]);
    }

    #[test]
    fn test_stale_owner_can_not_unregister() {
        reset_all();
        let context = ContextRegistry::new();
        let a = Widget::new(TestComponent::new(), attrs! { "widget" => "w1" }, &context).unwrap();
        let b = Widget::new(TestComponent::new(), attrs! { "widget" => "w1" }, &context).unwrap();

        assert!(context.is_owner(&b));
        assert!(!context.is_owner(&a));
        assert!(!context.unregister(&a));
        assert!(context.get("w1").unwrap().ptr_eq(&b));
        assert!(context.unregister(&b));
        assert!(context.is_empty());
        assert!(!context.contains("w1"));
    }

    #[test]
    fn test_watch_ids_is_reactive() {
        use spark_signals::effect;
        use std::cell::Cell;

        reset_all();
        let context = ContextRegistry::new();
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let context_clone = context.clone();
        let _e = effect(move || {
            let _ = context_clone.watch_ids();
            runs_clone.set(runs_clone.get() + 1);
        });
        assert_eq!(runs.get(), 1);

        let _w = Widget::new(TestComponent::new(), attrs! { "widget" => "w1" }, &context).unwrap();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_entries_do_not_keep_widgets_alive() {
        reset_all();
        let context = ContextRegistry::new();
        let widget = Widget::new(TestComponent::new(), attrs! { "widget" => "gone" }, &context).unwrap();
        drop(widget);
        assert!(context.get("gone").is_none());
    }
}
