//! # Example: basic
//!
//! Submits a handful of downloads-that-are-really-sleeps to a scheduler capped at
//! two concurrent attempts and prints progress and completion through callbacks.
//!
//! Results come back in submission order even though the fastest work finishes first.
//!
//! ## Flow
//! ```text
//! submit_all([300ms, 100ms, 0ms, 200ms])
//!   ├─► admit #0, #1            (concurrency = 2)
//!   ├─► #1 done ─► admit #2
//!   ├─► #2 done ─► admit #3
//!   ├─► #0 done
//!   ├─► #3 done
//!   └─► on_all_complete(results = [#0, #1, #2, #3])
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskpool::{Scheduler, SchedulerConfig, Subscribe, TaskContext, TaskError, WorkFn, WorkRef};
use tracing_subscriber::EnvFilter;

fn download(name: &'static str, ms: u64) -> WorkRef<String> {
    WorkFn::arc(move |ctx: TaskContext| async move {
        for step in 1..=4u32 {
            tokio::select! {
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
                _ = tokio::time::sleep(Duration::from_millis(ms / 4)) => {}
            }
            ctx.report_progress(f64::from(step) * 25.0);
        }
        Ok::<_, TaskError>(format!("{name} ({ms}ms)"))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = SchedulerConfig {
        concurrency: 2,
        ..SchedulerConfig::default()
    };

    #[cfg(feature = "logging")]
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(taskpool::LogWriter::default())];
    #[cfg(not(feature = "logging"))]
    let subs: Vec<Arc<dyn Subscribe>> = Vec::new();

    let sched: Scheduler<String, &'static str> = Scheduler::builder(cfg)
        .with_subscribers(subs)
        .on_progress(|rec, _snap| {
            println!("[{}] {:>5.1}%", rec.meta.unwrap_or("?"), rec.progress);
        })
        .on_task_complete(|rec, snap| {
            println!(
                "[{}] {} ({} of {} succeeded)",
                rec.meta.unwrap_or("?"),
                rec.status,
                snap.success_count,
                snap.len()
            );
        })
        .build()?;

    sched.submit_all_with_meta([
        (download("alpha", 300), "alpha"),
        (download("beta", 100), "beta"),
        (download("gamma", 0), "gamma"),
        (download("delta", 200), "delta"),
    ]);

    let snap = sched.wait_all_complete().await;
    for (i, res) in snap.results.iter().enumerate() {
        println!("results[{i}] = {res:?}");
    }
    Ok(())
}
