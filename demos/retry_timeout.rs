//! # Example: retry_timeout
//!
//! Shows the failure strategy at work:
//! - a flaky work that fails twice and is retried until it succeeds,
//! - a stuck work that only returns once its token is triggered, and is timed out,
//! - a work that is stopped before it ever runs.
//!
//! ## Flow
//! ```text
//! flaky:  attempt 1 ─► Err ─► Retry ─► attempt 2 ─► Err ─► Retry ─► attempt 3 ─► Ok
//! stuck:  attempt 1 ─► timer (200ms) ─► token cancelled ─► Err ─► Timeout
//! late:   pending   ─► stop()        ─► Stopped
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=taskpool=debug cargo run --example retry_timeout
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use taskpool::{
    DefaultStrategy, Event, EventKind, Scheduler, SchedulerConfig, SyncWorkFn, TaskContext,
    TaskError, TaskStatus, WorkFn,
};
use tracing_subscriber::EnvFilter;

static FLAKY_CALLS: AtomicU32 = AtomicU32::new(0);

fn describe(ev: &Event) -> Option<String> {
    let index = ev.index?;
    match ev.kind {
        EventKind::TaskRetrying => Some(format!(
            "#{index} retry {} after: {}",
            ev.retries.unwrap_or(0),
            ev.reason.as_deref().unwrap_or("?")
        )),
        EventKind::TimeoutHit => Some(format!(
            "#{index} timed out after {}ms",
            ev.timeout_ms.unwrap_or(0)
        )),
        EventKind::TaskCompleted => Some(format!(
            "#{index} settled as {}",
            ev.status.map(|s| s.as_label()).unwrap_or("?")
        )),
        _ => None,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = SchedulerConfig {
        concurrency: 2,
        timeout: Duration::from_millis(200),
        ..SchedulerConfig::default()
    };
    let sched: Scheduler<&'static str> = Scheduler::builder(cfg)
        .with_failure_strategy(DefaultStrategy::new(3))
        .build()?;

    let mut rx = sched.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(ev) = rx.recv().await {
            if ev.kind == EventKind::AllCompleted {
                break;
            }
            if let Some(line) = describe(&ev) {
                println!("{line}");
            }
        }
    });

    sched.submit(SyncWorkFn::arc(|_ctx: TaskContext| {
        let n = FLAKY_CALLS.fetch_add(1, Ordering::Relaxed) + 1;
        if n < 3 {
            return Err(TaskError::fail(format!("flaky failure #{n}")));
        }
        Ok("flaky recovered")
    }));

    sched.submit(WorkFn::arc(|ctx: TaskContext| async move {
        ctx.cancelled().await;
        Err::<&'static str, _>(TaskError::Canceled)
    }));

    // Let the flaky work burn through its retries, then park a record and stop.
    tokio::time::sleep(Duration::from_millis(50)).await;
    sched.pause();
    sched.submit(SyncWorkFn::arc(|_ctx: TaskContext| Ok::<_, TaskError>("never runs")));
    sched.stop();

    let snap = sched.wait_all_complete().await;
    printer.await?;

    for rec in &snap.tasks {
        println!(
            "#{} {:<8} retries={} attempts={} error={:?}",
            rec.index,
            rec.status.as_label(),
            rec.retries, rec.attempts, rec.error
        );
    }
    println!(
        "phase={} success={} timeout={} stopped={}",
        snap.phase.as_label(),
        snap.success_count,
        snap.count(TaskStatus::Timeout),
        snap.count(TaskStatus::Stopped),
    );
    Ok(())
}
