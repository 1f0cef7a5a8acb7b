//! Widget Engine - registries, scheduling and update coordination.
//!
//! The engine holds the machinery shared by every widget:
//! - Registry: Per-context instance-id to widget mapping, owner-checked removal
//! - Scheduler: Thread-local macrotask queue and local future pool
//! - Coordinator: Turns recursive update requests into a bounded drain loop
//!
//! # Threading
//!
//! Everything here is single-threaded. Widgets are `Rc` handles and the
//! scheduler lives in thread-locals, so a widget tree belongs to the thread
//! that built it.

pub mod coordinator;
pub mod registry;
pub mod scheduler;

pub use coordinator::{Request, UpdateCoordinator};
pub use registry::ContextRegistry;
pub use scheduler::{
    pending_tasks, reset_scheduler, run_until_idle, schedule, spawn_local, TaskHandle,
};
