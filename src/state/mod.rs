//! State Module - per-widget state containers
//!
//! - **Attributes** - Current attribute mapping, change detection, set options
//! - **Events** - Named handler lists with snapshot dispatch

pub mod attributes;
pub mod events;

pub use attributes::{AttributeStore, SetFlags, SetOptions, ARGUMENTS, CHILDREN};
pub use events::EventBus;
