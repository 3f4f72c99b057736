//! # Events emitted by the scheduler.
//!
//! The [`EventKind`] enum classifies events across three categories:
//! - **Task events**: record flow (submitted, starting, progress, timeout, retrying, completed)
//! - **Lifecycle events**: scheduler control (started, paused, resumed, stopped, destroyed, all-completed)
//! - **Subscriber events**: delivery problems (overflow, panic)
//!
//! The [`Event`] struct carries metadata such as timestamps, record id, attempt, and reasons.
//! Events are lightweight and carry no user values; callbacks receive full
//! [`Snapshot`](crate::Snapshot)s instead.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{Event, EventKind, TaskStatus};
//!
//! let ev = Event::new(EventKind::TaskCompleted)
//!     .with_index(2)
//!     .with_status(TaskStatus::Timeout)
//!     .with_reason("timed out after 20ms")
//!     .with_timeout(Duration::from_millis(20));
//!
//! assert_eq!(ev.kind, EventKind::TaskCompleted);
//! assert_eq!(ev.index, Some(2));
//! assert_eq!(ev.timeout_ms, Some(20));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::tasks::{TaskId, TaskStatus};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of scheduler events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// A record was appended to the backlog.
    ///
    /// Sets: `task`, `index`
    TaskSubmitted,

    /// A record was admitted and an attempt is starting.
    ///
    /// Sets: `task`, `index`, `attempt`, `retries`
    TaskStarting,

    /// Work reported progress.
    ///
    /// Sets: `task`, `index`, `attempt`, `progress`
    TaskProgress,

    /// The attempt's timer fired and its token was triggered.
    ///
    /// Sets: `task`, `index`, `attempt`, `timeout_ms`
    TimeoutHit,

    /// A failed attempt was requeued by the failure strategy.
    ///
    /// Sets: `task`, `index`, `attempt` (the failed one), `retries` (after increment), `reason`
    TaskRetrying,

    /// A record reached a terminal status.
    ///
    /// Sets: `task`, `index`, `attempt`, `retries`, `status`, `reason` (failures only)
    TaskCompleted,

    // === Lifecycle events ===
    /// Every record reached a terminal status (fires once).
    AllCompleted,

    /// `start()` enabled admission.
    SchedulerStarted,

    /// `pause()` suspended admission.
    SchedulerPaused,

    /// `resume()` lifted a pause.
    SchedulerResumed,

    /// `stop()` closed the scheduler for submissions.
    SchedulerStopped,

    /// `destroy()` tore the scheduler down. Always the last event.
    SchedulerDestroyed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `subscriber`, `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `subscriber`, `reason`
    SubscriberOverflow,
}

/// Scheduler event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Record id, if applicable.
    pub task: Option<TaskId>,
    /// Record submission index, if applicable.
    pub index: Option<usize>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Retries consumed by the record.
    pub retries: Option<u32>,
    /// Reported progress value.
    pub progress: Option<f64>,
    /// Terminal status (for `TaskCompleted`).
    pub status: Option<TaskStatus>,
    /// Attempt timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Subscriber name for subscriber events.
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            index: None,
            attempt: None,
            retries: None,
            progress: None,
            status: None,
            timeout_ms: None,
            reason: None,
            subscriber: None,
        }
    }

    /// Creates a task event carrying the record's id and index.
    #[inline]
    pub fn for_task(kind: EventKind, task: TaskId, index: usize) -> Self {
        Self::new(kind).with_task(task).with_index(index)
    }

    /// Attaches a record id.
    #[inline]
    pub fn with_task(mut self, task: TaskId) -> Self {
        self.task = Some(task);
        self
    }

    /// Attaches a submission index.
    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a retry count.
    #[inline]
    pub fn with_retries(mut self, n: u32) -> Self {
        self.retries = Some(n);
        self
    }

    /// Attaches a progress value.
    #[inline]
    pub fn with_progress(mut self, value: f64) -> Self {
        self.progress = Some(value);
        self
    }

    /// Attaches a record status.
    #[inline]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"));
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_terminal_for_scheduler(&self) -> bool {
        matches!(self.kind, EventKind::SchedulerDestroyed)
    }
}
