//! # Execution context handed to a work function.
//!
//! Each attempt receives its own [`TaskContext`] carrying:
//! - the attempt's [`CancelToken`] (fresh per attempt),
//! - a progress sink that stores the reported value on the record and notifies observers,
//! - identity of the record and attempt being executed.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::WaitForCancellationFuture;

use crate::tasks::{cancel::CancelToken, record::TaskId};

/// Sink receiving progress reports for one attempt.
pub(crate) type ProgressSink = Arc<dyn Fn(f64) + Send + Sync>;

/// Context of a single attempt.
#[derive(Clone)]
pub struct TaskContext {
    id: TaskId,
    index: usize,
    attempt: u32,
    token: CancelToken,
    progress: ProgressSink,
}

impl TaskContext {
    pub(crate) fn new(
        id: TaskId,
        index: usize,
        attempt: u32,
        token: CancelToken,
        progress: ProgressSink,
    ) -> Self {
        Self {
            id,
            index,
            attempt,
            token,
            progress,
        }
    }

    /// Context that is not attached to any scheduler; progress reports go nowhere.
    ///
    /// Handy for calling work functions directly in tests.
    pub fn detached(token: CancelToken) -> Self {
        Self::new(TaskId::next(), 0, 1, token, Arc::new(|_| {}))
    }

    /// Id of the record being executed.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Submission index of the record being executed.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Attempt number (1-based; retries increment it).
    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The attempt's cancellation token.
    #[inline]
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Returns `true` once the attempt has been asked to stop.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the attempt is asked to stop.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Reports progress. The value is stored verbatim; no range is enforced.
    ///
    /// Reports from an attempt that already settled are ignored.
    pub fn report_progress(&self, value: f64) {
        (self.progress)(value);
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("id", &self.id)
            .field("index", &self.index)
            .field("attempt", &self.attempt)
            .field("token", &self.token)
            .finish()
    }
}
