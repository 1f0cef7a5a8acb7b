//! Update Coordinator - coalesces aggregate `change` events into updates.
//!
//! A render can change attributes, and a change handler can change them
//! again. Calling `update()` recursively for each of those would grow the
//! stack with every round and race half-finished renders against each other.
//! The coordinator turns that recursion into a counter:
//!
//! ```text
//! request #1 ──► opens window, becomes drain owner
//!                loop while serviced < requested:
//!                    step()            ◄── nested requests only bump `requested`
//!                    serviced += 1
//!                closes window
//! ```
//!
//! Requests arriving while a window is open never re-enter the loop; the
//! owner's re-check services them. When more than `limit` requests pile up
//! in one window the guard trips: the offending request fails, the owner
//! stops after the current step, resets, and fails with the same error.
//!
//! The count is per window, not per nesting level, and it never goes down
//! while the window is open. A feedback chain that would eventually settle
//! is still rejected once it needs more than `limit` requests: with the
//! default limit of 10, a chain of ten requests drains and the eleventh
//! trips the guard.

use std::cell::Cell;

use crate::error::{Result, WidgetError};

/// Outcome of [`UpdateCoordinator::request`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// The window was idle; this call drained it.
    Drained,
    /// A drain is in progress; it will service this request.
    Queued,
}

/// Recursion-safe update counter.
#[derive(Debug)]
pub struct UpdateCoordinator {
    widget: String,
    limit: usize,
    /// Requests received in the open window.
    requested: Cell<usize>,
    /// Requests serviced in the open window.
    serviced: Cell<usize>,
    tripped: Cell<bool>,
}

impl UpdateCoordinator {
    pub fn new(widget: impl Into<String>, limit: usize) -> Self {
        Self {
            widget: widget.into(),
            limit,
            requested: Cell::new(0),
            serviced: Cell::new(0),
            tripped: Cell::new(false),
        }
    }

    /// Requests received in the current window (0 when idle).
    pub fn count(&self) -> usize {
        self.requested.get()
    }

    /// Requests received but not yet serviced.
    pub fn outstanding(&self) -> usize {
        self.requested.get() - self.serviced.get()
    }

    pub fn is_draining(&self) -> bool {
        self.requested.get() > 0
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Register one aggregate change. If no drain is active, run `step` until
    /// every request received meanwhile has been serviced.
    pub fn request<F>(&self, mut step: F) -> Result<Request>
    where
        F: FnMut() -> Result<()>,
    {
        let requested = self.requested.get() + 1;
        self.requested.set(requested);

        if requested > self.limit {
            self.tripped.set(true);
            tracing::error!(widget = %self.widget, limit = self.limit, "too many recursive updates");
            return Err(self.overflow());
        }
        if requested > 1 {
            tracing::trace!(widget = %self.widget, requested, "update queued behind active drain");
            return Ok(Request::Queued);
        }

        while self.serviced.get() < self.requested.get() {
            if let Err(err) = step() {
                self.reset();
                return Err(err);
            }
            if self.tripped.get() {
                self.reset();
                return Err(self.overflow());
            }
            self.serviced.set(self.serviced.get() + 1);
        }
        self.reset();
        Ok(Request::Drained)
    }

    fn overflow(&self) -> WidgetError {
        WidgetError::TooManyRecursiveUpdates {
            widget: self.widget.clone(),
            limit: self.limit,
        }
    }

    fn reset(&self) {
        self.requested.set(0);
        self.serviced.set(0);
        self.tripped.set(false);
    }
}
