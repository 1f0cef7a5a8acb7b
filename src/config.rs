//! Widget configuration.
//!
//! The current configuration lives in a thread-local, like the rest of the
//! per-thread UI state. Widgets snapshot it when they are constructed, so
//! changing it later only affects widgets created afterwards.
//!
//! ```
//! use spark_widgets::config::{self, WidgetConfig};
//!
//! config::set_config(WidgetConfig::default().with_max_recursive_updates(4));
//! assert_eq!(config::config().max_recursive_updates, 4);
//! config::reset_config();
//! ```

use std::cell::RefCell;

/// Attribute-name prefix marking an event subscription (`ev-click` -> `click`).
pub const EVENT_PREFIX: &str = "ev-";

/// Default threshold for the recursive update guard.
pub const DEFAULT_MAX_RECURSIVE_UPDATES: usize = 10;

/// Tunables for widget construction and update coordination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetConfig {
    /// Change requests allowed in a single drain window before the guard trips.
    pub max_recursive_updates: usize,
    /// Prefix for generated instance ids (`widget0`, `widget1`, ...).
    pub id_prefix: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            max_recursive_updates: DEFAULT_MAX_RECURSIVE_UPDATES,
            id_prefix: "widget".to_string(),
        }
    }
}

impl WidgetConfig {
    pub fn with_max_recursive_updates(mut self, limit: usize) -> Self {
        self.max_recursive_updates = limit;
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }
}

thread_local! {
    static CONFIG: RefCell<WidgetConfig> = RefCell::new(WidgetConfig::default());
}

/// Get the current configuration.
pub fn config() -> WidgetConfig {
    CONFIG.with(|c| c.borrow().clone())
}

/// Replace the current configuration.
pub fn set_config(config: WidgetConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Restore the default configuration (for testing).
pub fn reset_config() {
    set_config(WidgetConfig::default());
}
