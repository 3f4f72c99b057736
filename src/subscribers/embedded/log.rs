//! # LogWriter: event renderer
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`
//! under the `taskpool::events` target.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO taskpool::events: starting task=#3 index=2 attempt=1
//! INFO taskpool::events: timeout task=#3 index=2 attempt=1 timeout_ms=20
//! INFO taskpool::events: retrying task=#3 index=2 retries=1 err="timed out after 20ms"
//! INFO taskpool::events: completed task=#3 index=2 status=success
//! INFO taskpool::events: all-completed
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "taskpool::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Renders an event id as `#n`, or `-` when absent.
fn task_of(e: &Event) -> String {
    e.task.map_or_else(|| "-".to_string(), |t| t.to_string())
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = task_of(e);
        let err = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::TaskSubmitted => {
                tracing::debug!(target: TARGET, "submitted task={task} index={:?}", e.index);
            }
            EventKind::TaskStarting => {
                tracing::info!(target: TARGET, "starting task={task} index={:?} attempt={:?}", e.index, e.attempt);
            }
            EventKind::TaskProgress => {
                tracing::debug!(target: TARGET, "progress task={task} index={:?} value={:?}", e.index, e.progress);
            }
            EventKind::TimeoutHit => {
                tracing::info!(
                    target: TARGET,
                    "timeout task={task} index={:?} attempt={:?} timeout_ms={:?}",
                    e.index, e.attempt, e.timeout_ms
                );
            }
            EventKind::TaskRetrying => {
                tracing::info!(
                    target: TARGET,
                    "retrying task={task} index={:?} retries={:?} err={err:?}",
                    e.index, e.retries
                );
            }
            EventKind::TaskCompleted => match e.status {
                Some(status) if e.reason.is_some() => {
                    tracing::warn!(target: TARGET, "completed task={task} index={:?} status={status} err={err:?}", e.index);
                }
                Some(status) => {
                    tracing::info!(target: TARGET, "completed task={task} index={:?} status={status}", e.index);
                }
                None => {
                    tracing::info!(target: TARGET, "completed task={task} index={:?}", e.index);
                }
            },
            EventKind::AllCompleted => tracing::info!(target: TARGET, "all-completed"),
            EventKind::SchedulerStarted => tracing::info!(target: TARGET, "started"),
            EventKind::SchedulerPaused => tracing::info!(target: TARGET, "paused"),
            EventKind::SchedulerResumed => tracing::info!(target: TARGET, "resumed"),
            EventKind::SchedulerStopped => tracing::info!(target: TARGET, "stopped"),
            EventKind::SchedulerDestroyed => tracing::info!(target: TARGET, "destroyed"),
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: TARGET, "subscriber-overflow subscriber={:?} reason={err:?}", e.subscriber);
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(
                    target: TARGET,
                    "subscriber-panicked subscriber={} info={err}",
                    e.subscriber.unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskStatus;

    #[tokio::test]
    async fn test_renders_every_kind_without_panicking() {
        let w = LogWriter::new();
        for kind in [
            EventKind::TaskSubmitted,
            EventKind::TaskStarting,
            EventKind::TaskProgress,
            EventKind::TimeoutHit,
            EventKind::TaskRetrying,
            EventKind::TaskCompleted,
            EventKind::AllCompleted,
            EventKind::SchedulerStarted,
            EventKind::SchedulerPaused,
            EventKind::SchedulerResumed,
            EventKind::SchedulerStopped,
            EventKind::SchedulerDestroyed,
            EventKind::SubscriberOverflow,
            EventKind::SubscriberPanicked,
        ] {
            w.on_event(&Event::new(kind).with_status(TaskStatus::Error).with_reason("x"))
                .await;
        }
        assert_eq!(w.name(), "LogWriter");
    }
}
