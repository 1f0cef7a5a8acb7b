//! Error types for widget construction, updates and callbacks.
//!
//! Two of these are programmer errors that must never be absorbed:
//! - [`WidgetError::MissingTemplate`] - a component type has no template bound.
//! - [`WidgetError::TooManyRecursiveUpdates`] - attribute-change handlers feed
//!   back into each other faster than the update loop can settle.
//!
//! Everything raised by user callbacks and hooks travels as
//! [`WidgetError::Handler`] and propagates to whoever called `set`, `trigger`,
//! `update` or `destroy`.

use thiserror::Error;

/// Errors produced by the widget core.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetError {
    /// The component has no render template.
    #[error("can not instantiate `{widget}`: template does not exist")]
    MissingTemplate {
        /// Display name of the component.
        widget: String,
    },

    /// The update coordinator saw more change requests than allowed in one drain window.
    #[error("too many recursive updates on `{widget}` (limit {limit})")]
    TooManyRecursiveUpdates {
        /// Instance id of the widget.
        widget: String,
        /// The configured threshold.
        limit: usize,
    },

    /// A lifecycle operation was attempted after `destroy`.
    #[error("can not {operation} `{widget}`: widget is destroyed")]
    Destroyed {
        /// Instance id of the widget.
        widget: String,
        /// The rejected operation.
        operation: &'static str,
    },

    /// The `arguments` attribute resolved to something other than a map.
    #[error("`arguments` attribute of `{widget}` must resolve to a map")]
    InvalidArguments {
        /// Instance id of the widget.
        widget: String,
    },

    /// Error raised inside an event handler, option callback or extension hook.
    #[error("{0}")]
    Handler(String),
}

impl WidgetError {
    /// Build a [`WidgetError::Handler`] from any message.
    pub fn handler(message: impl Into<String>) -> Self {
        WidgetError::Handler(message.into())
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            WidgetError::MissingTemplate { .. } => "widget_missing_template",
            WidgetError::TooManyRecursiveUpdates { .. } => "widget_recursive_update",
            WidgetError::Destroyed { .. } => "widget_destroyed",
            WidgetError::InvalidArguments { .. } => "widget_invalid_arguments",
            WidgetError::Handler(_) => "widget_handler",
        }
    }

    /// True for errors that signal a definitional mistake rather than a runtime condition.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            WidgetError::MissingTemplate { .. } | WidgetError::TooManyRecursiveUpdates { .. }
        )
    }
}

/// Result type for widget operations.
pub type Result<T> = std::result::Result<T, WidgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_violated_invariant() {
        let err = WidgetError::MissingTemplate { widget: "Dialog".into() };
        assert_eq!(
            err.to_string(),
            "can not instantiate `Dialog`: template does not exist"
        );

        let err = WidgetError::TooManyRecursiveUpdates { widget: "w1".into(), limit: 10 };
        assert!(err.to_string().contains("too many recursive updates"));
        assert!(err.is_programmer_error());
    }

    #[test]
    fn test_labels() {
        assert_eq!(WidgetError::handler("boom").as_label(), "widget_handler");
        assert!(!WidgetError::handler("boom").is_programmer_error());
        assert_eq!(WidgetError::handler("boom").to_string(), "boom");
    }
}
