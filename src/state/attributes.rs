//! Attribute Store - current attribute mapping with change detection.
//!
//! The store only knows values. Deciding which events to emit for a change
//! set is the widget's job (see `Widget::set_with`); the store reports which
//! keys changed, in input order.
//!
//! # Children
//!
//! `children` is not an ordinary attribute. It is hoisted out of the mapping
//! at construction and kept in its own slot. `get("children")` still answers,
//! preferring an explicit `children` attribute set later over the hoisted value.

use std::cell::{Ref, RefCell};

use bitflags::bitflags;
use indexmap::IndexMap;

use crate::types::{Attributes, Callback, Value};

/// Reserved attribute holding the widget's sub-tree.
pub const CHILDREN: &str = "children";

/// Reserved attribute whose resolved map is spliced into the attributes.
pub const ARGUMENTS: &str = "arguments";

// =============================================================================
// Set Options
// =============================================================================

bitflags! {
    /// Emission flags for [`SetOptions`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SetFlags: u8 {
        /// Suppress every event (option callbacks still run).
        const SILENT = 1 << 0;
        /// Emit the aggregate `change` event.
        const GLOBAL = 1 << 1;
        /// Defer the aggregate `change` event to the next macrotask.
        const ASYNC = 1 << 2;
    }
}

impl Default for SetFlags {
    fn default() -> Self {
        SetFlags::GLOBAL
    }
}

/// Options for a `set` call.
///
/// Defaults: not silent, global, synchronous, no callbacks.
#[derive(Clone, Debug, Default)]
pub struct SetOptions {
    pub flags: SetFlags,
    /// Per-attribute callbacks, the `change:<attr>` options.
    pub attr_callbacks: IndexMap<String, Callback>,
    /// Catch-all callback, the `change` option.
    pub change_callback: Option<Callback>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options used for construction-time assignment.
    pub fn silent() -> Self {
        Self::new().with_silent(true)
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.flags.set(SetFlags::SILENT, silent);
        self
    }

    pub fn with_global(mut self, global: bool) -> Self {
        self.flags.set(SetFlags::GLOBAL, global);
        self
    }

    pub fn with_async(mut self, deferred: bool) -> Self {
        self.flags.set(SetFlags::ASYNC, deferred);
        self
    }

    /// Run `callback` with `[widget, value]` when `attr` changes.
    pub fn on_attr_change(mut self, attr: impl Into<String>, callback: Callback) -> Self {
        self.attr_callbacks.insert(attr.into(), callback);
        self
    }

    /// Run `callback` with `[widget]` once after all attribute callbacks.
    pub fn on_change(mut self, callback: Callback) -> Self {
        self.change_callback = Some(callback);
        self
    }

    pub fn is_silent(&self) -> bool {
        self.flags.contains(SetFlags::SILENT)
    }

    pub fn is_global(&self) -> bool {
        self.flags.contains(SetFlags::GLOBAL)
    }

    pub fn is_async(&self) -> bool {
        self.flags.contains(SetFlags::ASYNC)
    }
}

// =============================================================================
// Attribute Store
// =============================================================================

/// Current attribute mapping plus the hoisted children slot.
#[derive(Debug, Default)]
pub struct AttributeStore {
    attributes: RefCell<Attributes>,
    children: RefCell<Value>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live view of the whole mapping.
    ///
    /// Do not hold the guard across a `set`.
    pub fn all(&self) -> Ref<'_, Attributes> {
        self.attributes.borrow()
    }

    /// Current value of `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let attributes = self.attributes.borrow();
        if key == CHILDREN {
            return match attributes.get(CHILDREN) {
                Some(value) if !value.is_null() => Some(value.clone()),
                _ => (!self.children.borrow().is_null()).then(|| self.children.borrow().clone()),
            };
        }
        attributes.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.borrow().contains_key(key)
    }

    /// Write every entry of `input` that differs from the stored value.
    ///
    /// Returns the changed keys in input order. Unchanged entries keep their
    /// stored value untouched.
    pub fn apply(&self, input: Attributes) -> Vec<String> {
        let mut attributes = self.attributes.borrow_mut();
        let mut changes = Vec::new();
        for (key, value) in input {
            if attributes.get(&key) == Some(&value) {
                continue;
            }
            attributes.insert(key.clone(), value);
            changes.push(key);
        }
        changes
    }

    /// Remove an attribute without notifying anyone.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.attributes.borrow_mut().shift_remove(key)
    }

    /// Merge `extra` into the mapping without change detection.
    pub fn extend(&self, extra: Attributes) {
        self.attributes.borrow_mut().extend(extra);
    }

    /// Move `children` out of the mapping into its own slot.
    pub fn hoist_children(&self) {
        let children = self.remove(CHILDREN).unwrap_or_default();
        *self.children.borrow_mut() = children;
    }

    /// The hoisted children.
    pub fn children(&self) -> Value {
        self.children.borrow().clone()
    }

    /// Entries whose key starts with `prefix` and whose value is callable.
    pub fn callables_with_prefix(&self, prefix: &str) -> Vec<(String, Callback)> {
        self.attributes
            .borrow()
            .iter()
            .filter_map(|(key, value)| {
                let cb = value.as_callback()?;
                key.starts_with(prefix).then(|| (key.clone(), cb.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;

    #[test]
    fn test_apply_reports_changes_in_input_order() {
        let store = AttributeStore::new();
        store.apply(attrs! { "a" => 1, "b" => 2 });

        let changes = store.apply(attrs! { "b" => 3, "a" => 1, "c" => "new" });
        assert_eq!(changes, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(store.get("b"), Some(Value::from(3)));
    }

    #[test]
    fn test_equal_values_are_not_changes() {
        let store = AttributeStore::new();
        store.apply(attrs! { "list" => vec![1, 2], "map" => attrs! { "k" => "v" } });

        let changes = store.apply(attrs! { "list" => vec![1, 2], "map" => attrs! { "k" => "v" } });
        assert!(changes.is_empty());
    }

    #[test]
    fn test_children_hoisting_and_override() {
        let store = AttributeStore::new();
        store.apply(attrs! { "children" => vec![1, 2, 3], "title" => "t" });
        store.hoist_children();

        assert!(!store.contains("children"));
        assert_eq!(store.children(), Value::from(vec![1, 2, 3]));
        assert_eq!(store.get("children"), Some(Value::from(vec![1, 2, 3])));

        store.apply(attrs! { "children" => "override" });
        assert_eq!(store.get("children"), Some(Value::from("override")));
        assert_eq!(store.children(), Value::from(vec![1, 2, 3]));
    }

    #[test]
    fn test_callables_with_prefix() {
        let store = AttributeStore::new();
        let cb = Callback::handler(|_| Ok(()));
        store.apply(attrs! { "ev-click" => cb.clone(), "ev-label" => "not callable", "click" => cb.clone() });

        let found = store.callables_with_prefix("ev-");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "ev-click");
        assert!(found[0].1.ptr_eq(&cb));
    }

    #[test]
    fn test_set_options_defaults() {
        let options = SetOptions::new();
        assert!(options.is_global());
        assert!(!options.is_silent());
        assert!(!options.is_async());

        let options = SetOptions::silent().with_async(true).with_global(false);
        assert!(options.is_silent());
        assert!(options.is_async());
        assert!(!options.is_global());
    }
}
