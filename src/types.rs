//! Core types - attribute values, attribute maps and callbacks.
//!
//! Widgets are attribute-driven: every piece of observable widget state is a
//! named [`Value`] inside an [`Attributes`] map. Values are dynamic because the
//! template layer that reads them is dynamic, but equality is structural so
//! change detection does not depend on allocation identity.
//!
//! # Equality
//!
//! | Variant | Compared by |
//! |---------|-------------|
//! | `Null`, `Bool`, `String` | value |
//! | `Number` | value, with `NaN == NaN` |
//! | `Array` | element-wise |
//! | `Map` | key-wise, ignoring key order |
//! | `Function`, `Widget` | identity (`Rc::ptr_eq`) |

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{Result, WidgetError};
use crate::widget::Widget;

// =============================================================================
// Attributes
// =============================================================================

/// Ordered attribute mapping. Iteration order is insertion order.
pub type Attributes = IndexMap<String, Value>;

/// Build an [`Attributes`] map from `key => value` pairs.
///
/// ```
/// use spark_widgets::{attrs, Value};
///
/// let a = attrs! { "title" => "Hello", "count" => 3 };
/// assert_eq!(a.get("count"), Some(&Value::Number(3.0)));
/// ```
#[macro_export]
macro_rules! attrs {
    () => { $crate::Attributes::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Attributes::new();
        $( map.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        map
    }};
}

// =============================================================================
// Callback
// =============================================================================

/// Shared callable used for event handlers, `ev-*` attributes and option callbacks.
///
/// Identity is the `Rc` allocation: two clones of the same callback are equal,
/// two callbacks built from identical closures are not.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&[Value]) -> Result<Value>>);

impl Callback {
    /// Wrap a closure returning a value.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Self(Rc::new(f))
    }

    /// Wrap a closure used purely for its side effects.
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<()> + 'static,
    {
        Self(Rc::new(move |args: &[Value]| f(args).map(|()| Value::Null)))
    }

    /// Invoke the callback.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.0)(args)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

// =============================================================================
// Value
// =============================================================================

/// A dynamic attribute value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Map(Attributes),
    Function(Callback),
    Widget(Widget),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Function(cb) => Some(cb),
            _ => None,
        }
    }

    pub fn as_widget(&self) -> Option<&Widget> {
        match self {
            Value::Widget(w) => Some(w),
            _ => None,
        }
    }

    /// Resolve a possibly-lazy value: functions are called with no arguments.
    pub fn resolve(&self) -> Result<Value> {
        match self {
            Value::Function(cb) => cb.call(&[]),
            other => Ok(other.clone()),
        }
    }

    /// Resolve into a map, or fail with the given widget id.
    pub(crate) fn resolve_map(&self, widget: &str) -> Result<Attributes> {
        match self.resolve()? {
            Value::Map(map) => Ok(map),
            Value::Null => Ok(Attributes::new()),
            _ => Err(WidgetError::InvalidArguments { widget: widget.to_string() }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            // IndexMap equality ignores insertion order
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Widget(a), Value::Widget(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Attributes> for Value {
    fn from(map: Attributes) -> Self {
        Value::Map(map)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Value::Function(cb)
    }
}

impl From<Widget> for Value {
    fn from(widget: Widget) -> Self {
        Value::Widget(widget)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::from(vec![1, 2, 3]), Value::from(vec![1, 2, 3]));
        assert_ne!(Value::from(vec![1, 2, 3]), Value::from(vec![1, 2]));
        assert_eq!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Null, Value::Bool(false));
        assert_ne!(Value::from("1"), Value::from(1));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a = attrs! { "x" => 1, "y" => vec!["a", "b"] };
        let b = attrs! { "y" => vec!["a", "b"], "x" => 1 };
        assert_eq!(Value::Map(a), Value::Map(b));
    }

    #[test]
    fn test_callbacks_compare_by_identity() {
        let f = Callback::handler(|_| Ok(()));
        let g = Callback::handler(|_| Ok(()));
        assert_eq!(Value::from(f.clone()), Value::from(f.clone()));
        assert_ne!(Value::from(f), Value::from(g));
    }

    #[test]
    fn test_resolve_calls_functions() {
        let lazy = Value::from(Callback::new(|_| Ok(Value::from(attrs! { "a" => 1 }))));
        assert_eq!(lazy.resolve_map("w").unwrap(), attrs! { "a" => 1 });
        assert_eq!(Value::Null.resolve_map("w").unwrap(), Attributes::new());
        assert!(matches!(
            Value::from(3).resolve_map("w"),
            Err(WidgetError::InvalidArguments { .. })
        ));
    }
}
