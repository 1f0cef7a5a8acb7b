//! Scheduler - cooperative macrotask queue for deferred widget work.
//!
//! The widget core is single-threaded and synchronous, with one exception:
//! `set(.., async)` defers the aggregate `change` event to the next macrotask.
//! This module is that event loop.
//!
//! - `schedule(f)` queues a macrotask and returns a [`TaskHandle`]
//! - `TaskHandle::cancel()` drops a queued task (idempotent)
//! - `spawn_local(fut)` drives `!Send` futures (async init hooks)
//! - `run_until_idle()` is the yield point: it runs every queued macrotask,
//!   including ones queued while running, then stalls the future pool
//!
//! # Example
//!
//! ```ignore
//! let handle = scheduler::schedule(|| {
//!     println!("next tick");
//!     Ok(())
//! });
//! handle.cancel(); // never runs
//! scheduler::run_until_idle()?;
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use crate::error::Result;

// =============================================================================
// Task Handle
// =============================================================================

/// Handle to a queued macrotask.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    id: u64,
    state: Rc<Cell<TaskState>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TaskState {
    Queued,
    Running,
    Done,
    Cancelled,
}

impl TaskHandle {
    /// Cancel the task if it has not run yet.
    ///
    /// Cancelling a task that already ran or was already cancelled does nothing.
    pub fn cancel(&self) {
        if self.state.get() == TaskState::Queued {
            self.state.set(TaskState::Cancelled);
            tracing::trace!(task = self.id, "macrotask cancelled");
        }
    }

    /// True while the task is queued and not cancelled.
    pub fn is_pending(&self) -> bool {
        self.state.get() == TaskState::Queued
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.get() == TaskState::Cancelled
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

// =============================================================================
// Event Loop State
// =============================================================================

type Macrotask = Box<dyn FnOnce() -> Result<()>>;

struct EventLoop {
    queue: VecDeque<(TaskHandle, Macrotask)>,
    next_id: u64,
}

thread_local! {
    static EVENT_LOOP: RefCell<EventLoop> = RefCell::new(EventLoop {
        queue: VecDeque::new(),
        next_id: 0,
    });

    /// Executor for local futures. Kept apart from the queue so futures can
    /// schedule macrotasks while the pool runs.
    static POOL: RefCell<LocalPool> = RefCell::new(LocalPool::new());

    static SPAWNER: RefCell<LocalSpawner> = POOL.with(|pool| RefCell::new(pool.borrow().spawner()));

    /// Errors raised by futures, reported by the next `run_until_idle`.
    static FUTURE_ERRORS: RefCell<Vec<crate::error::WidgetError>> = const { RefCell::new(Vec::new()) };
}

// =============================================================================
// Public API
// =============================================================================

/// Queue a macrotask for the next turn of the loop.
pub fn schedule<F>(task: F) -> TaskHandle
where
    F: FnOnce() -> Result<()> + 'static,
{
    EVENT_LOOP.with(|event_loop| {
        let mut event_loop = event_loop.borrow_mut();
        let id = event_loop.next_id;
        event_loop.next_id += 1;
        let handle = TaskHandle {
            id,
            state: Rc::new(Cell::new(TaskState::Queued)),
        };
        event_loop.queue.push_back((handle.clone(), Box::new(task)));
        tracing::trace!(task = id, "macrotask scheduled");
        handle
    })
}

/// Drive a local future to completion on the loop.
///
/// An error returned by the future is reported by the next [`run_until_idle`].
pub fn spawn_local<F>(future: F)
where
    F: Future<Output = Result<()>> + 'static,
{
    let spawned = SPAWNER.with(|spawner| {
        spawner.borrow().spawn_local(async move {
            if let Err(err) = future.await {
                FUTURE_ERRORS.with(|errors| errors.borrow_mut().push(err));
            }
        })
    });
    if let Err(err) = spawned {
        tracing::error!(error = %err, "local executor refused future");
    }
}

/// Run queued macrotasks and local futures until nothing is left to do.
///
/// Returns the number of macrotasks that ran. The first error raised by a
/// task or future stops the loop and is returned; tasks still queued stay
/// queued for the next call.
///
/// Must not be called from inside a task or future.
pub fn run_until_idle() -> Result<usize> {
    let mut ran = 0;
    loop {
        POOL.with(|pool| pool.borrow_mut().run_until_stalled());
        take_future_error()?;

        let Some((handle, task)) = EVENT_LOOP.with(|event_loop| event_loop.borrow_mut().queue.pop_front()) else {
            break;
        };
        if handle.state.get() != TaskState::Queued {
            continue;
        }
        handle.state.set(TaskState::Running);
        let result = task();
        handle.state.set(TaskState::Done);
        ran += 1;
        result?;
    }
    Ok(ran)
}

/// Number of queued, not-cancelled macrotasks.
pub fn pending_tasks() -> usize {
    EVENT_LOOP.with(|event_loop| {
        event_loop
            .borrow()
            .queue
            .iter()
            .filter(|(handle, _)| handle.is_pending())
            .count()
    })
}

/// Drop every queued task, spawned future and pending future error (for testing).
pub fn reset_scheduler() {
    POOL.with(|pool| {
        let fresh = LocalPool::new();
        SPAWNER.with(|spawner| *spawner.borrow_mut() = fresh.spawner());
        // Dropping the old pool drops its unfinished futures.
        drop(std::mem::replace(&mut *pool.borrow_mut(), fresh));
    });
    EVENT_LOOP.with(|event_loop| {
        let mut event_loop = event_loop.borrow_mut();
        for (handle, _) in event_loop.queue.drain(..) {
            handle.cancel();
        }
        event_loop.next_id = 0;
    });
    FUTURE_ERRORS.with(|errors| errors.borrow_mut().clear());
}

fn take_future_error() -> Result<()> {
    let err = FUTURE_ERRORS.with(|errors| {
        let mut errors = errors.borrow_mut();
        (!errors.is_empty()).then(|| errors.remove(0))
    });
    match err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WidgetError;

    #[test]
    fn test_tasks_run_in_order() {
        reset_scheduler();
        let log = Rc::new(RefCell::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            schedule(move || {
                log.borrow_mut().push(i);
                Ok(())
            });
        }
        assert_eq!(pending_tasks(), 3);
        assert_eq!(run_until_idle().unwrap(), 3);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert_eq!(pending_tasks(), 0);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        reset_scheduler();
        let ran = Rc::new(Cell::new(false));
        let ran_clone = ran.clone();
        let handle = schedule(move || {
            ran_clone.set(true);
            Ok(())
        });

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(run_until_idle().unwrap(), 0);
        assert!(!ran.get());
    }

    #[test]
    fn test_cancel_after_run_is_noop() {
        reset_scheduler();
        let handle = schedule(|| Ok(()));
        run_until_idle().unwrap();
        handle.cancel();
        assert!(!handle.is_cancelled());
        assert!(!handle.is_pending());
    }

    #[test]
    fn test_tasks_scheduled_while_running_also_run() {
        reset_scheduler();
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();
        schedule(move || {
            let inner = count_clone.clone();
            schedule(move || {
                inner.set(inner.get() + 1);
                Ok(())
            });
            count_clone.set(count_clone.get() + 1);
            Ok(())
        });
        assert_eq!(run_until_idle().unwrap(), 2);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_task_error_propagates() {
        reset_scheduler();
        schedule(|| Err(WidgetError::handler("tick failed")));
        assert_eq!(run_until_idle(), Err(WidgetError::handler("tick failed")));
    }

    #[test]
    fn test_spawn_local_runs_future() {
        reset_scheduler();
        let done = Rc::new(Cell::new(false));
        let done_clone = done.clone();
        spawn_local(async move {
            done_clone.set(true);
            Ok(())
        });
        run_until_idle().unwrap();
        assert!(done.get());

        spawn_local(async { Err(WidgetError::handler("init failed")) });
        assert_eq!(run_until_idle(), Err(WidgetError::handler("init failed")));
    }

    #[test]
    fn test_reset_drops_spawned_futures() {
        reset_scheduler();
        let done = Rc::new(Cell::new(false));
        let done_clone = done.clone();
        spawn_local(async move {
            done_clone.set(true);
            Ok(())
        });

        reset_scheduler();
        run_until_idle().unwrap();
        assert!(!done.get());

        // The fresh pool still accepts work.
        let again = done.clone();
        spawn_local(async move {
            again.set(true);
            Ok(())
        });
        run_until_idle().unwrap();
        assert!(done.get());
    }
}
