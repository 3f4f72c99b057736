//! Error types used by the taskpool scheduler and by work functions.
//!
//! This module defines two enums:
//!
//! - [`TaskError`]: failures of a single attempt of a work function.
//! - [`ConfigError`]: misconfiguration detected while building a [`Scheduler`](crate::Scheduler).
//!
//! Task failures never escape the scheduler: they are captured per record and exposed
//! through [`TaskRecord::error`](crate::TaskRecord::error) and the terminal status.
//! `ConfigError` is the only error a caller sees synchronously.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a single attempt of a work function.
///
/// Every variant is routed through the configured
/// [`FailureStrategy`](crate::FailureStrategy), which decides whether the
/// record is retried or settled.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Work failed with an ordinary error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The attempt's timer fired before the work settled.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The configured per-attempt timeout.
        timeout: Duration,
    },

    /// Work observed its cancellation token and gave up.
    #[error("context cancelled")]
    Canceled,

    /// Work panicked while being created or polled.
    #[error("work panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use taskpool::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Canceled => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Canceled => "context cancelled".to_string(),
            TaskError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Returns `true` for [`TaskError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, TaskError::Timeout { .. })
    }
}

/// # Errors raised while building a scheduler.
///
/// These represent programmer misuse and are reported once, at construction.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `SchedulerConfig::concurrency` was zero; nothing could ever be admitted.
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    /// `build()` was called outside of a tokio runtime.
    #[error("no tokio runtime available to spawn attempts on")]
    NoRuntime,
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskpool::ConfigError;
    ///
    /// assert_eq!(ConfigError::ZeroConcurrency.as_label(), "config_zero_concurrency");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroConcurrency => "config_zero_concurrency",
            ConfigError::NoRuntime => "config_no_runtime",
        }
    }
}
