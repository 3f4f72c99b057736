//! # taskpool
//!
//! **Taskpool** is a bounded-concurrency task scheduler for tokio.
//!
//! It accepts a growing backlog of independent units of work, runs at most
//! `concurrency` of them at once, routes every failure through a pluggable
//! failure strategy (retry, timeout or error), and reports per-record outcomes
//! while keeping results in submission order.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   WorkRef    │   │   WorkRef    │   │   WorkRef    │
//!     │  (index 0)   │   │  (index 1)   │   │  (index 2)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ submit()         ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler (mutex-guarded core)                                   │
//! │  - backlog: Vec<TaskRecord>        (index == submission order)    │
//! │  - pending: VecDeque<index>        (FIFO admission)               │
//! │  - Lifecycle (start/pause/resume/stop/destroy)                    │
//! │  - FailureStrategy (retry | fail | timeout)                       │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼ admit            ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   (waits for a slot) │
//!     │  run_once    │   │  run_once    │                      │
//!     │ (attempt #1) │   │ (attempt #1) │                      │
//!     └┬─────────────┘   └┬─────────────┘                      │
//!      │ settle()         │ settle()                           │
//!      │ ─► backfill slot │                                    │
//!      ▼                  ▼                                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SchedulerConfig::bus_capacity)            │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      worker1   worker2   workerN
//! ```
//!
//! Typed callbacks (`on_progress`, `on_task_complete`, `on_all_complete`) are
//! invoked directly by the core after its lock is released, with a fresh
//! [`Snapshot`].
//!
//! ### Record lifecycle
//! ```text
//! pending ──► running ──┬─► success
//!    ▲                  ├─► error     (strategy: Fail)
//!    │                  ├─► timeout   (strategy: Timeout)
//!    └──── retry ───────┤             (strategy: Retry, retries += 1)
//!                       └─► cancelled (destroy)
//! pending ──► stopped   (stop)
//! pending ──► cancelled (destroy)
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Scheduling**    | Bounded admission, lifecycle control, snapshots.                | [`Scheduler`], [`SchedulerBuilder`]         |
//! | **Work**          | Define work as closures or trait objects.                       | [`Work`], [`WorkFn`], [`SyncWorkFn`]        |
//! | **Cancellation**  | Per-attempt cooperative token (timeout, destroy).               | [`CancelToken`], [`TaskContext`]            |
//! | **Policies**      | Decide what happens to a failed attempt.                        | [`FailureStrategy`], [`DefaultStrategy`]    |
//! | **Observability** | Typed callbacks, broadcast events, subscriber fan-out.          | [`Callbacks`], [`Event`], [`Subscribe`]     |
//! | **Errors**        | Typed errors for attempts and configuration.                    | [`TaskError`], [`ConfigError`]              |
//! | **Configuration** | Centralize scheduler settings.                                  | [`SchedulerConfig`]                         |
//!
//! ## Optional features
//! - `logging` (default): exports a built-in [`LogWriter`] subscriber rendering events via `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskpool::{Scheduler, SchedulerConfig, TaskContext, TaskError, TaskStatus, WorkFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = SchedulerConfig {
//!         concurrency: 2,
//!         timeout: Duration::from_secs(5),
//!         retry: 1,
//!         ..SchedulerConfig::default()
//!     };
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> = vec![Arc::new(taskpool::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskpool::Subscribe>> = Vec::new();
//!
//!     let sched: Scheduler<String, &'static str> = Scheduler::builder(cfg)
//!         .with_subscribers(subs)
//!         .on_task_complete(|rec, snap| {
//!             println!("{} -> {} ({} done)", rec.id, rec.status, snap.success_count);
//!         })
//!         .build()?;
//!
//!     let greet = WorkFn::arc(|ctx: TaskContext| async move {
//!         ctx.report_progress(0.5);
//!         if ctx.is_cancelled() {
//!             return Err(TaskError::Canceled);
//!         }
//!         Ok::<_, TaskError>(format!("hello from #{}", ctx.index()))
//!     });
//!     sched.submit_with_meta(greet, "greeting");
//!
//!     let snap = sched.wait_all_complete().await;
//!     assert_eq!(snap.tasks[0].status, TaskStatus::Success);
//!     assert_eq!(snap.results[0].as_deref(), Some("hello from #0"));
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{Phase, Scheduler, SchedulerBuilder, SchedulerConfig};
pub use error::{ConfigError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::{
    DefaultStrategy, FailureAction, FailureContext, FailureStrategy, TimeoutOnlyRetry,
};
pub use subscribers::{Callbacks, SnapshotHook, Subscribe, SubscriberSet, TaskHook};
pub use tasks::{
    BoxWorkFuture, CancelReason, CancelToken, Snapshot, SyncWorkFn, TaskContext, TaskId,
    TaskRecord, TaskStatus, Work, WorkFn, WorkRef,
};

// Optional: expose a simple built-in logger subscriber.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
