//! Failure policies.
//!
//! This module groups the knobs that control **what happens** to a record whose
//! attempt failed or timed out.
//!
//! ## Contents
//! - [`FailureStrategy`] decision trait (`decide(&FailureContext) -> FailureAction`)
//! - [`DefaultStrategy`] retry any failure up to `R` times
//! - [`TimeoutOnlyRetry`] retry only timeouts up to `R` times
//!
//! ## Quick wiring
//! ```text
//! SchedulerBuilder::with_failure_strategy(S)
//!      └─► core::scheduler settles a failed attempt:
//!           - Retry   → requeue at back of pending queue
//!           - Timeout → status `timeout`
//!           - Fail    → status `error`
//! ```
//!
//! ## Defaults
//! - `DefaultStrategy::new(cfg.retry)`; with `retry = 0` nothing is retried.

mod failure;

pub use failure::{
    DefaultStrategy, FailureAction, FailureContext, FailureStrategy, TimeoutOnlyRetry,
};
