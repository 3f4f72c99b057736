//! # Scheduler configuration.
//!
//! Provides [`SchedulerConfig`] centralized settings for a scheduler.
//! Strategies, callbacks and subscribers are not plain data and are set on
//! [`SchedulerBuilder`](crate::SchedulerBuilder) instead.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no timeout
//! - `concurrency = 0` → rejected by `build()` with [`ConfigError::ZeroConcurrency`]

use std::time::Duration;

use crate::error::ConfigError;

/// Construction-time configuration.
///
/// ## Field semantics
/// - `concurrency`: maximum attempts in flight at once (`>= 1`)
/// - `auto_start`: admit immediately on submission; otherwise wait for `start()`
/// - `timeout`: per-attempt timeout (`0s` = none)
/// - `retry`: retry budget of the default failure strategy
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use taskpool::SchedulerConfig;
///
/// let cfg = SchedulerConfig {
///     concurrency: 2,
///     timeout: Duration::from_millis(500),
///     retry: 3,
///     ..SchedulerConfig::default()
/// };
/// assert_eq!(cfg.attempt_timeout(), Some(Duration::from_millis(500)));
/// ```
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Maximum number of attempts running at once.
    pub concurrency: usize,

    /// Whether submissions are admitted without an explicit `start()`.
    pub auto_start: bool,

    /// Per-attempt timeout.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = a timer is armed at the start of every attempt, retries included
    pub timeout: Duration,

    /// Retry budget for the default failure strategy.
    ///
    /// Ignored when a custom strategy is set on the builder.
    pub retry: u32,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl SchedulerConfig {
    /// Returns the per-attempt timeout as an `Option`.
    #[inline]
    pub fn attempt_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks the configuration for values that could never work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    /// Default configuration:
    ///
    /// - `concurrency = 5`
    /// - `auto_start = true`
    /// - `timeout = 0s` (no timeout)
    /// - `retry = 0` (no retries)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            concurrency: 5,
            auto_start: true,
            timeout: Duration::ZERO,
            retry: 0,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.concurrency, 5);
        assert!(cfg.auto_start);
        assert_eq!(cfg.attempt_timeout(), None);
        assert_eq!(cfg.retry, 0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let cfg = SchedulerConfig {
            concurrency: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroConcurrency));
    }

    #[test]
    fn test_bus_capacity_is_clamped() {
        let cfg = SchedulerConfig {
            bus_capacity: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
