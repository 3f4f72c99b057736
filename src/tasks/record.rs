//! # Task records and their state machine.
//!
//! A record is created per submitted unit of work and tracked by the scheduler
//! until it reaches a terminal status.
//!
//! ## Transitions
//! ```text
//!              admission                  value
//!   Pending ─────────────► Running ───────────────────► Success
//!     ▲  │                   │ │ │   failure + Fail
//!     │  │                   │ │ └──────────────────────► Error
//!     │  │                   │ │     timeout + Timeout
//!     │  │                   │ └────────────────────────► Timeout
//!     │  │     Retry         │
//!     └──┼───────────────────┘
//!        │ stop()                       destroy()
//!        ├─────────────────► Stopped    Pending/Running ──► Cancelled
//!        └──────────────────────────────────────────────► Cancelled
//! ```
//!
//! Terminal statuses are never overwritten. The only way out of `Running` other than
//! a terminal status is the retry path back to `Pending`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::error::TaskError;

/// Global id counter; ids are never reused within a process.
static TASK_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique, monotonically increasing task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocates the next id.
    pub(crate) fn next() -> Self {
        Self(TASK_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw numeric id.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle status of a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Waiting in the pending queue for an admission slot.
    Pending,
    /// An attempt is in flight.
    Running,
    /// Work settled with a value.
    Success,
    /// Work failed and the strategy settled it as a failure.
    Error,
    /// Work timed out and the strategy settled it as a timeout.
    Timeout,
    /// The scheduler was stopped before the record started.
    Stopped,
    /// The scheduler was destroyed while the record was pending or running.
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` for every status a record can end in.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    /// Returns `true` if the state machine allows `self → next`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Stopped)
                | (Pending, Cancelled)
                | (Running, Success)
                | (Running, Error)
                | (Running, Timeout)
                | (Running, Pending)
                | (Running, Cancelled)
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Error => "error",
            TaskStatus::Timeout => "timeout",
            TaskStatus::Stopped => "stopped",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Point-in-time copy of a task record.
///
/// Handed out through [`Snapshot`](crate::Snapshot) and the observability callbacks.
/// Mutating a `TaskRecord` never affects the scheduler.
///
/// ### Field semantics
/// - `index`: 0-based submission position, aligned with [`Snapshot::results`](crate::Snapshot::results)
/// - `retries`: retry attempts already consumed (only grows on a strategy `Retry`)
/// - `attempts`: attempts started so far, including the one in flight
/// - `progress`: last value reported by the work, stored verbatim (no range enforced)
/// - `result` / `error`: mutually exclusive, set only on terminal settlement
/// - `meta`: opaque caller value, never inspected by the scheduler
#[derive(Debug, Clone)]
pub struct TaskRecord<T, M = ()> {
    /// Process-unique id assigned at submission.
    pub id: TaskId,
    /// Submission position.
    pub index: usize,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Retries consumed.
    pub retries: u32,
    /// Attempts started.
    pub attempts: u32,
    /// Last reported progress.
    pub progress: f64,
    /// Wall-clock start of the current (or last) attempt.
    pub started_at: Option<SystemTime>,
    /// Wall-clock settlement time; `None` while pending or running.
    pub ended_at: Option<SystemTime>,
    /// Success value.
    pub result: Option<T>,
    /// Failure of the final attempt.
    pub error: Option<TaskError>,
    /// Caller-supplied correlation value.
    pub meta: Option<M>,
}

impl<T, M> TaskRecord<T, M> {
    /// Creates a fresh pending record.
    pub(crate) fn pending(index: usize, meta: Option<M>) -> Self {
        Self {
            id: TaskId::next(),
            index,
            status: TaskStatus::Pending,
            retries: 0,
            attempts: 0,
            progress: 0.0,
            started_at: None,
            ended_at: None,
            result: None,
            error: None,
            meta,
        }
    }

    /// Returns `true` if the record reached a terminal status.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall-clock duration of the last attempt, if it has settled.
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        let start = self.started_at?;
        let end = self.ended_at?;
        end.duration_since(start).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert!(b > a);
        assert_ne!(a.get(), b.get());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        for s in [
            TaskStatus::Success,
            TaskStatus::Error,
            TaskStatus::Timeout,
            TaskStatus::Stopped,
            TaskStatus::Cancelled,
        ] {
            assert!(s.is_terminal(), "{s} should be terminal");
        }
    }

    #[test]
    fn test_terminal_status_cannot_be_overwritten() {
        let all = [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Success,
            TaskStatus::Error,
            TaskStatus::Timeout,
            TaskStatus::Stopped,
            TaskStatus::Cancelled,
        ];
        for from in all.into_iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be illegal");
            }
        }
    }

    #[test]
    fn test_retry_reopens_running_to_pending_only() {
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Success));
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Stopped));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Timeout));
    }

    #[test]
    fn test_pending_record_defaults() {
        let rec: TaskRecord<u32, &str> = TaskRecord::pending(3, Some("order-7"));
        assert_eq!(rec.index, 3);
        assert_eq!(rec.status, TaskStatus::Pending);
        assert_eq!(rec.retries, 0);
        assert_eq!(rec.progress, 0.0);
        assert!(rec.started_at.is_none());
        assert!(rec.result.is_none() && rec.error.is_none());
        assert_eq!(rec.meta, Some("order-7"));
        assert!(rec.elapsed().is_none());
    }
}
