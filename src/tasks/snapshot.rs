//! # Point-in-time scheduler state.
//!
//! A [`Snapshot`] is an independent copy: mutating it never affects the scheduler,
//! and later scheduler activity never changes an existing snapshot.

use crate::core::Phase;
use crate::tasks::record::{TaskRecord, TaskStatus};

/// Independent copy of the scheduler state.
///
/// ### Invariants
/// - `tasks.len() == results.len()`
/// - `tasks[i].index == i` (submission order)
/// - `results[i]` is `Some` only if `tasks[i].status == Success`
#[derive(Debug, Clone)]
pub struct Snapshot<T, M = ()> {
    /// All records in submission order.
    pub tasks: Vec<TaskRecord<T, M>>,
    /// Success values aligned with `tasks`.
    pub results: Vec<Option<T>>,
    /// Records settled as `Success`.
    pub success_count: usize,
    /// Attempts currently in flight.
    pub running_count: usize,
    /// Records waiting in the pending queue.
    pub pending_count: usize,
    /// Lifecycle phase at the time of the snapshot.
    pub phase: Phase,
}

impl<T, M> Snapshot<T, M> {
    /// Number of records ever submitted.
    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if nothing was submitted yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns `true` if every record reached a terminal status.
    pub fn is_settled(&self) -> bool {
        self.tasks.iter().all(TaskRecord::is_terminal)
    }

    /// Counts records currently in `status`.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}
