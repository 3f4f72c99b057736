mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskpool::{
    CancelReason, Phase, Scheduler, SchedulerConfig, TaskContext, TaskError, TaskStatus, WorkFn,
};
use tokio::time;

use common::{delayed, settle_briefly, until_cancelled};

fn cfg(concurrency: usize) -> SchedulerConfig {
    SchedulerConfig {
        concurrency,
        ..SchedulerConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_pause_blocks_admission_but_not_in_flight_work() {
    let sched: Scheduler<u8> = Scheduler::new(cfg(2)).unwrap();
    sched.submit_all([delayed(10, 0), delayed(10, 1)]);
    sched.pause();
    assert_eq!(sched.phase(), Phase::Paused);

    sched.submit_all([delayed(10, 2), delayed(10, 3)]);
    let snap = sched.snapshot();
    assert_eq!(snap.running_count, 2);
    assert_eq!(snap.pending_count, 2);

    time::sleep(Duration::from_millis(20)).await;
    let snap = sched.snapshot();
    assert_eq!(snap.success_count, 2);
    assert_eq!(snap.running_count, 0);
    assert_eq!(snap.pending_count, 2);

    sched.resume();
    assert_eq!(sched.phase(), Phase::Running);
    assert_eq!(sched.snapshot().running_count, 2);

    let snap = sched.wait_all_complete().await;
    assert_eq!(snap.results, vec![Some(0), Some(1), Some(2), Some(3)]);
}

#[tokio::test(start_paused = true)]
async fn test_running_count_never_grows_while_paused() {
    let sched: Scheduler<u8> = Scheduler::new(cfg(4)).unwrap();
    sched.pause();
    for i in 0..6 {
        sched.submit(delayed(1, i));
        assert_eq!(sched.snapshot().running_count, 0);
    }
    time::sleep(Duration::from_millis(5)).await;
    assert_eq!(sched.snapshot().pending_count, 6);
}

#[tokio::test(start_paused = true)]
async fn test_manual_start_gates_admission() {
    let sched: Scheduler<u8> = Scheduler::new(SchedulerConfig {
        auto_start: false,
        ..SchedulerConfig::default()
    })
    .unwrap();
    sched.submit_all([delayed(1, 0), delayed(1, 1)]);
    assert_eq!(sched.phase(), Phase::Idle);
    assert_eq!(sched.snapshot().running_count, 0);

    // Resuming an idle scheduler does not start it.
    sched.pause();
    sched.resume();
    assert_eq!(sched.phase(), Phase::Idle);
    assert_eq!(sched.snapshot().pending_count, 2);

    sched.start();
    assert_eq!(sched.phase(), Phase::Running);
    assert_eq!(sched.snapshot().running_count, 2);
    let snap = sched.wait_all_complete().await;
    assert_eq!(snap.success_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_start_clears_pause() {
    let sched: Scheduler<u8> = Scheduler::new(cfg(1)).unwrap();
    sched.pause();
    sched.submit(delayed(1, 9));
    sched.start();
    assert_eq!(sched.snapshot().running_count, 1);
    assert_eq!(sched.wait_all_complete().await.results, vec![Some(9)]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_sweeps_pending_and_lets_running_finish() {
    let all_done = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&all_done);
    let sched: Scheduler<u8> = Scheduler::builder(cfg(1))
        .on_all_complete(move |_snap| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    sched.submit_all([delayed(10, 0), delayed(10, 1), delayed(10, 2)]);
    sched.stop();
    assert_eq!(sched.phase(), Phase::Stopped);
    assert_eq!(sched.phase().as_label(), "stopped");

    let snap = sched.snapshot();
    assert_eq!(snap.tasks[0].status, TaskStatus::Running);
    assert_eq!(snap.tasks[1].status, TaskStatus::Stopped);
    assert_eq!(snap.tasks[2].status, TaskStatus::Stopped);
    assert_eq!(snap.tasks[1].attempts, 0);

    assert_eq!(sched.submit(delayed(1, 3)), None);
    assert!(sched.submit_all([delayed(1, 4)]).is_empty());

    let snap = sched.wait_all_complete().await;
    assert!(snap.is_settled());
    assert_eq!(snap.tasks[0].status, TaskStatus::Success);
    assert_eq!(snap.count(TaskStatus::Stopped), 2);
    assert_eq!(snap.results, vec![Some(0), None, None]);
    assert_eq!(all_done.load(Ordering::SeqCst), 1);

    sched.resume();
    sched.start();
    assert_eq!(sched.phase(), Phase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_stop_is_swept_to_stopped() {
    let sched: Scheduler<u8> = Scheduler::new(SchedulerConfig {
        retry: 3,
        ..SchedulerConfig::default()
    })
    .unwrap();
    sched.submit(WorkFn::arc(|_ctx: TaskContext| async {
        time::sleep(Duration::from_millis(5)).await;
        Err::<u8, _>(TaskError::fail("flaky"))
    }));
    sched.stop();

    let snap = sched.wait_all_complete().await;
    assert_eq!(snap.tasks[0].status, TaskStatus::Stopped);
    assert_eq!(snap.tasks[0].retries, 1);
    assert_eq!(snap.tasks[0].attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_cancels_running_and_pending() {
    let observed = Arc::new(AtomicBool::new(false));
    let reason = Arc::new(Mutex::new(None));
    let completions = Arc::new(AtomicUsize::new(0));

    let hits = Arc::clone(&completions);
    let sched: Scheduler<u8> = Scheduler::builder(cfg(1))
        .on_task_complete(move |_rec, _snap| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let (flag, why) = (Arc::clone(&observed), Arc::clone(&reason));
    sched.submit(WorkFn::arc(move |ctx: TaskContext| {
        let (flag, why) = (Arc::clone(&flag), Arc::clone(&why));
        async move {
            ctx.cancelled().await;
            flag.store(true, Ordering::SeqCst);
            *why.lock().unwrap() = ctx.token().reason();
            // Settles with a value; the attempt was already forced to cancelled.
            Ok::<u8, TaskError>(1)
        }
    }));
    sched.submit(delayed(1, 2));
    settle_briefly().await;
    assert_eq!(sched.snapshot().tasks[0].status, TaskStatus::Running);

    sched.destroy();
    assert!(sched.is_destroyed());
    assert_eq!(sched.phase(), Phase::Destroyed);

    let snap = sched.snapshot();
    assert_eq!(snap.tasks[0].status, TaskStatus::Cancelled);
    assert_eq!(snap.tasks[0].error, Some(TaskError::Canceled));
    assert_eq!(snap.tasks[1].status, TaskStatus::Cancelled);
    assert_eq!(snap.tasks[1].attempts, 0);
    assert_eq!(snap.running_count, 0);
    assert_eq!(snap.pending_count, 0);
    assert_eq!(snap.count(TaskStatus::Cancelled), 2);
    assert_eq!(snap.phase.as_label(), "destroyed");

    settle_briefly().await;
    assert!(observed.load(Ordering::SeqCst));
    assert_eq!(*reason.lock().unwrap(), Some(CancelReason::Destroyed));

    // Frozen: the late settlement changed nothing and nothing new is accepted.
    let frozen = sched.snapshot();
    assert_eq!(frozen.tasks[0].status, TaskStatus::Cancelled);
    assert_eq!(frozen.results, vec![None, None]);
    assert_eq!(sched.submit(delayed(1, 3)), None);
    assert!(sched.submit_all_with_meta([(delayed(1, 4), ())]).is_empty());
    assert_eq!(sched.snapshot().len(), 2);

    // Callbacks were released before records were cancelled.
    assert_eq!(completions.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_is_idempotent() {
    let sched: Scheduler<u8> = Scheduler::new(cfg(2)).unwrap();
    sched.submit_all([until_cancelled(), until_cancelled(), until_cancelled()]);
    settle_briefly().await;

    let mut rx = sched.subscribe();
    sched.destroy();
    let once = sched.snapshot();
    sched.destroy();
    let twice = sched.snapshot();

    let statuses = |s: &taskpool::Snapshot<u8>| s.tasks.iter().map(|t| t.status).collect::<Vec<_>>();
    assert_eq!(statuses(&once), statuses(&twice));
    assert_eq!(once.phase, twice.phase);

    let mut destroyed = 0;
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == taskpool::EventKind::SchedulerDestroyed {
            destroyed += 1;
        }
    }
    assert_eq!(destroyed, 1);

    sched.pause();
    sched.resume();
    sched.start();
    sched.stop();
    assert_eq!(sched.phase(), Phase::Destroyed);
}

#[tokio::test(start_paused = true)]
async fn test_wait_all_complete_resolves_on_destroy() {
    let sched: Scheduler<u8> = Scheduler::new(cfg(1)).unwrap();
    sched.submit(until_cancelled());

    let waiter = {
        let sched = sched.clone();
        tokio::spawn(async move { sched.wait_all_complete().await })
    };
    settle_briefly().await;
    sched.destroy();

    let snap = waiter.await.unwrap();
    assert_eq!(snap.phase, Phase::Destroyed);
    assert_eq!(snap.tasks[0].status, TaskStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_all_complete_fires_once_across_batches() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let sched: Scheduler<u8> = Scheduler::builder(cfg(2))
        .on_all_complete(move |_snap| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    sched.submit(delayed(1, 0));
    sched.wait_all_complete().await;
    sched.submit(delayed(1, 1));
    time::sleep(Duration::from_millis(5)).await;

    assert_eq!(sched.snapshot().success_count, 2);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
