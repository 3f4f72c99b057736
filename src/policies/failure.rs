//! # Failure strategies.
//!
//! A [`FailureStrategy`] decides what happens to a record whose attempt failed:
//!
//! ```text
//! attempt failed (error or timeout)
//!      └─► strategy.decide(&FailureContext) ─┬─► Retry   → retries += 1, back of pending queue
//!                                            ├─► Timeout → settle as `timeout`
//!                                            └─► Fail    → settle as `error`
//! ```
//!
//! The strategy is a pure function of its context. It never touches the record;
//! the scheduler applies the returned action. It runs while the scheduler's state is
//! locked, so it must not call back into the scheduler.
//!
//! ## Built-in strategies
//! | Strategy             | Ordinary failure                 | Timeout failure                     |
//! |----------------------|----------------------------------|-------------------------------------|
//! | [`DefaultStrategy`]  | retry while `retries < R`, fail  | retry while `retries < R`, timeout  |
//! | [`TimeoutOnlyRetry`] | fail immediately                 | retry while `retries < R`, timeout  |
//!
//! Any `Fn(&FailureContext) -> FailureAction` closure is a strategy too.

use crate::error::TaskError;
use crate::tasks::TaskId;

/// Outcome of a failure decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Requeue the record at the back of the pending queue.
    Retry,
    /// Settle the record as `error`.
    Fail,
    /// Settle the record as `timeout`.
    Timeout,
}

/// Facts about a failed attempt.
///
/// Carries the scheduling fields of the record only; the caller's `meta` is never
/// exposed to strategies.
#[derive(Debug, Clone, Copy)]
pub struct FailureContext<'a> {
    /// Record id.
    pub id: TaskId,
    /// Submission index.
    pub index: usize,
    /// Retries already consumed (before this decision).
    pub retries: u32,
    /// Attempt that just failed (1-based).
    pub attempt: u32,
    /// Raw error reported by the attempt.
    pub error: &'a TaskError,
    /// `true` if the attempt's timer fired before it settled.
    pub is_timeout: bool,
}

/// Decides how a failed attempt is handled.
pub trait FailureStrategy: Send + Sync + 'static {
    /// Returns the action for this failure.
    fn decide(&self, ctx: &FailureContext<'_>) -> FailureAction;
}

impl<F> FailureStrategy for F
where
    F: Fn(&FailureContext<'_>) -> FailureAction + Send + Sync + 'static,
{
    fn decide(&self, ctx: &FailureContext<'_>) -> FailureAction {
        self(ctx)
    }
}

/// Retries any failure up to `max_retries` times.
///
/// This is the strategy a scheduler uses unless another one is configured,
/// parameterized by [`SchedulerConfig::retry`](crate::SchedulerConfig::retry).
///
/// # Example
/// ```rust
/// use taskpool::{DefaultStrategy, Scheduler, SchedulerConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), taskpool::ConfigError> {
///     let sched = Scheduler::<u32>::builder(SchedulerConfig::default())
///         .with_failure_strategy(DefaultStrategy::new(3))
///         .build()?;
///     assert_eq!(sched.snapshot().len(), 0);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultStrategy {
    /// Maximum retries per record.
    pub max_retries: u32,
}

impl DefaultStrategy {
    /// Creates a strategy retrying up to `max_retries` times.
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }
}

impl FailureStrategy for DefaultStrategy {
    fn decide(&self, ctx: &FailureContext<'_>) -> FailureAction {
        if ctx.retries < self.max_retries {
            FailureAction::Retry
        } else if ctx.is_timeout {
            FailureAction::Timeout
        } else {
            FailureAction::Fail
        }
    }
}

/// Retries only timeouts, up to `max_retries` times; ordinary failures fail at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutOnlyRetry {
    /// Maximum timeout retries per record.
    pub max_retries: u32,
}

impl TimeoutOnlyRetry {
    /// Creates a strategy retrying timeouts up to `max_retries` times.
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }
}

impl FailureStrategy for TimeoutOnlyRetry {
    fn decide(&self, ctx: &FailureContext<'_>) -> FailureAction {
        if !ctx.is_timeout {
            FailureAction::Fail
        } else if ctx.retries < self.max_retries {
            FailureAction::Retry
        } else {
            FailureAction::Timeout
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ctx(error: &TaskError, retries: u32, is_timeout: bool) -> FailureContext<'_> {
        FailureContext {
            id: TaskId::next(),
            index: 0,
            retries,
            attempt: retries + 1,
            error,
            is_timeout,
        }
    }

    #[test]
    fn test_default_retries_until_budget_spent() {
        let s = DefaultStrategy::new(2);
        let err = TaskError::fail("boom");
        assert_eq!(s.decide(&ctx(&err, 0, false)), FailureAction::Retry);
        assert_eq!(s.decide(&ctx(&err, 1, false)), FailureAction::Retry);
        assert_eq!(s.decide(&ctx(&err, 2, false)), FailureAction::Fail);
    }

    #[test]
    fn test_default_reports_timeout_when_exhausted() {
        let s = DefaultStrategy::new(1);
        let err = TaskError::Timeout {
            timeout: Duration::from_millis(20),
        };
        assert_eq!(s.decide(&ctx(&err, 0, true)), FailureAction::Retry);
        assert_eq!(s.decide(&ctx(&err, 1, true)), FailureAction::Timeout);
    }

    #[test]
    fn test_default_zero_retries_never_retries() {
        let s = DefaultStrategy::default();
        let err = TaskError::Canceled;
        assert_eq!(s.decide(&ctx(&err, 0, true)), FailureAction::Timeout);
        assert_eq!(s.decide(&ctx(&err, 0, false)), FailureAction::Fail);
    }

    #[test]
    fn test_timeout_only_never_retries_plain_errors() {
        let s = TimeoutOnlyRetry::new(3);
        let err = TaskError::fail("boom");
        assert_eq!(s.decide(&ctx(&err, 0, false)), FailureAction::Fail);
    }

    #[test]
    fn test_timeout_only_retries_timeouts() {
        let s = TimeoutOnlyRetry::new(1);
        let err = TaskError::Canceled;
        assert_eq!(s.decide(&ctx(&err, 0, true)), FailureAction::Retry);
        assert_eq!(s.decide(&ctx(&err, 1, true)), FailureAction::Timeout);
    }

    #[test]
    fn test_closure_is_a_strategy() {
        let s = |c: &FailureContext<'_>| {
            if c.error.is_timeout() {
                FailureAction::Timeout
            } else {
                FailureAction::Fail
            }
        };
        let err = TaskError::fail("x");
        assert_eq!(s.decide(&ctx(&err, 0, false)), FailureAction::Fail);
    }
}
