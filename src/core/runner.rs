//! # Run a single attempt of a work function.
//!
//! Executes one attempt with an optional timer and reports how it settled.
//!
//! - **Execute ONE attempt** with the attempt's own [`CancelToken`]
//! - **Arm the timer** if configured; on expiry trigger the token and publish `TimeoutHit`
//! - **Wait for settlement**: cancellation is cooperative, the attempt is only over
//!   once the work's future completes
//! - **Isolate panics**: a panic while creating or polling the future becomes
//!   [`TaskError::Panicked`]
//!
//! ## Flow
//! ```text
//! work.run(ctx) ─┬─ settles first ─────────────────────────► outcome (timed_out = false)
//!                └─ timer fires ─► token.cancel(Timeout)
//!                                  publish TimeoutHit
//!                                  await work settlement ──► outcome (timed_out = true)
//! ```
//!
//! ## Rules
//! - A settlement that races with a fired timer is **timeout-flavored**: `timed_out`
//!   is taken from the token, not from which branch won.
//! - If the token was triggered for another reason (destroy), the timer is a no-op.

use std::time::Duration;

use futures::FutureExt;
use tokio::{select, time};

use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
    tasks::{CancelReason, TaskContext, Work},
};

/// How one attempt settled.
#[derive(Debug)]
pub(crate) struct AttemptOutcome<T> {
    /// What the work returned.
    pub result: Result<T, TaskError>,
    /// `true` if the attempt's timer fired before settlement.
    pub timed_out: bool,
}

/// Executes a single attempt of `work`.
///
/// ### Timeout behavior
/// If `timeout` is `Some(dur)` and `dur > 0`:
/// - a timer is armed when the attempt starts
/// - on expiry the attempt's token is triggered with [`CancelReason::Timeout`]
///   and `TimeoutHit` is published; the runner keeps waiting for the work
pub(crate) async fn run_once<T, W>(
    work: &W,
    ctx: TaskContext,
    timeout: Option<Duration>,
    bus: &Bus,
) -> AttemptOutcome<T>
where
    T: Send + 'static,
    W: Work<T> + ?Sized,
{
    let token = ctx.token().clone();
    let (id, index, attempt) = (ctx.id(), ctx.index(), ctx.attempt());

    let fut = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| work.run(ctx))) {
        Ok(fut) => fut,
        Err(payload) => {
            return AttemptOutcome {
                result: Err(TaskError::Panicked {
                    info: panic_message(&*payload),
                }),
                timed_out: false,
            };
        }
    };
    let guarded = std::panic::AssertUnwindSafe(fut)
        .catch_unwind()
        .map(|res| {
            res.unwrap_or_else(|payload| {
                Err(TaskError::Panicked {
                    info: panic_message(&*payload),
                })
            })
        });
    tokio::pin!(guarded);

    let result = match timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => {
            let sleep = time::sleep(dur);
            tokio::pin!(sleep);
            select! {
                biased;
                res = &mut guarded => res,
                _ = &mut sleep => {
                    if token.cancel(CancelReason::Timeout) {
                        tracing::debug!(task = %id, index, attempt, ?dur, "attempt timed out");
                        bus.publish(
                            Event::for_task(EventKind::TimeoutHit, id, index)
                                .with_attempt(attempt)
                                .with_timeout(dur),
                        );
                    }
                    guarded.await
                }
            }
        }
        None => guarded.await,
    };

    AttemptOutcome {
        result,
        timed_out: token.reason() == Some(CancelReason::Timeout),
    }
}
