#![allow(dead_code)]

use std::time::Duration;

use taskpool::{SyncWorkFn, TaskContext, TaskError, WorkFn, WorkRef};
use tokio::time;

/// Sleeps `ms` then yields `value`.
pub fn delayed<T>(ms: u64, value: T) -> WorkRef<T>
where
    T: Clone + Send + Sync + 'static,
{
    WorkFn::arc(move |_ctx: TaskContext| {
        let value = value.clone();
        async move {
            time::sleep(Duration::from_millis(ms)).await;
            Ok::<_, TaskError>(value)
        }
    })
}

/// Settles only when its token is triggered.
pub fn until_cancelled<T: Send + 'static>() -> WorkRef<T> {
    WorkFn::arc(|ctx: TaskContext| async move {
        ctx.cancelled().await;
        Err::<T, _>(TaskError::Canceled)
    })
}

/// Always fails with `msg`.
pub fn failing<T: Send + 'static>(msg: &'static str) -> WorkRef<T> {
    SyncWorkFn::arc(move |_ctx: TaskContext| Err::<T, _>(TaskError::fail(msg)))
}

/// Lets spawned attempts run without moving the paused clock far.
pub async fn settle_briefly() {
    time::sleep(Duration::from_millis(1)).await;
}
