//! # Task abstractions and records.
//!
//! This module provides the task-related types:
//! - [`Work`] - trait for implementing async cancelable work
//! - [`WorkFn`] / [`SyncWorkFn`] - closure-backed work
//! - [`WorkRef`] - shared reference to work (`Arc<dyn Work<T>>`)
//! - [`TaskContext`] - per-attempt context (token + progress sink)
//! - [`CancelToken`] - per-attempt cancellation signal
//! - [`TaskRecord`] / [`TaskStatus`] / [`TaskId`] - the tracked record and its state machine
//! - [`Snapshot`] - independent copy of scheduler state

mod cancel;
mod context;
mod record;
mod snapshot;
mod work;

pub use cancel::{CancelReason, CancelToken};
pub use context::TaskContext;
pub(crate) use context::ProgressSink;
pub use record::{TaskId, TaskRecord, TaskStatus};
pub use snapshot::Snapshot;
pub use work::{BoxWorkFuture, SyncWorkFn, Work, WorkFn, WorkRef};
