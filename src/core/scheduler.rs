//! # Scheduler: bounded-concurrency admission over a growing backlog.
//!
//! The [`Scheduler`] owns the backlog, admits pending records up to
//! `concurrency`, applies the failure strategy to every failed attempt, and exposes
//! lifecycle control (start/pause/resume/stop/destroy) and observability.
//!
//! ## Architecture
//! ```text
//! submit(work) ──► State.push ──► admit() ──► Launch ─┐ (after lock release)
//!                                   ▲                 ▼
//!                                   │         rt.spawn(run_once(work, ctx))
//!                                   │                 │
//!                                   │                 ▼
//!                                   └──────── settle(index, attempt, outcome)
//!                                              ├─ Ok            ─► Success
//!                                              └─ Err / timeout ─► FailureStrategy::decide
//!                                                    ├─ Retry   ─► requeue (back of queue)
//!                                                    ├─ Timeout ─► Timeout
//!                                                    └─ Fail    ─► Error
//! ```
//!
//! ## Locking
//! All state transitions happen under one `std::sync::Mutex`. Events are published
//! under the lock, so bus order matches transition order. Callback notices are queued
//! on an outbox under the same lock and delivered after it is released, one at a
//! time and in queue order, so callbacks may call back into the scheduler and never
//! overlap. `wait_all_complete` wakes only once the notices queued before the
//! all-complete point have been delivered.
//!
//! ## Rules
//! - `running_count <= concurrency` at every instant.
//! - Admission is FIFO; retries go to the back of the pending queue.
//! - `results[i]` belongs to the i-th submitted record and is set only on `Success`.
//! - A settlement from an attempt that is no longer current (already forced to
//!   `Cancelled`) is ignored.
//! - After `destroy()` every operation is a no-op and the backlog is frozen.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskpool::{Scheduler, SchedulerConfig, TaskContext, TaskError, WorkFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sched: Scheduler<u64> = Scheduler::new(SchedulerConfig {
//!         concurrency: 2,
//!         ..SchedulerConfig::default()
//!     })?;
//!
//!     for ms in [30u64, 10, 0] {
//!         sched.submit(WorkFn::arc(move |_ctx: TaskContext| async move {
//!             tokio::time::sleep(Duration::from_millis(ms)).await;
//!             Ok::<_, TaskError>(ms)
//!         }));
//!     }
//!
//!     let snap = sched.wait_all_complete().await;
//!     assert_eq!(snap.results, vec![Some(30), Some(10), Some(0)]);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::SchedulerBuilder,
        config::SchedulerConfig,
        lifecycle::Phase,
        runner::{AttemptOutcome, run_once},
        state::{Launch, State},
    },
    error::{ConfigError, TaskError},
    events::{Bus, Event, EventKind},
    policies::{FailureAction, FailureContext, FailureStrategy},
    subscribers::{Callbacks, Dispatch, Notice, Outbox},
    tasks::{
        CancelReason, ProgressSink, Snapshot, TaskContext, TaskId, TaskStatus, WorkRef,
    },
};

/// Whether the all-complete notification (or destruction) has happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completion {
    Pending,
    AllComplete,
    Destroyed,
}

/// Side effects collected under the lock and carried out after it is released.
struct Effects<T, M> {
    launches: Vec<Launch<T>>,
    notices: Vec<Notice<T, M>>,
    all_complete: bool,
}

impl<T, M> Default for Effects<T, M> {
    fn default() -> Self {
        Self {
            launches: Vec::new(),
            notices: Vec::new(),
            all_complete: false,
        }
    }
}

struct Inner<T, M> {
    cfg: SchedulerConfig,
    strategy: Arc<dyn FailureStrategy>,
    state: Mutex<State<T, M>>,
    callbacks: RwLock<Callbacks<T, M>>,
    outbox: Outbox<T, M>,
    /// `false` once no callback is set (or after destroy); skips snapshot copies.
    observed: AtomicBool,
    bus: Bus,
    rt: Handle,
    runtime_token: CancellationToken,
    completion: watch::Sender<Completion>,
}

impl<T, M> Drop for Inner<T, M> {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

/// Bounded-concurrency scheduler handle.
///
/// Cheap to clone; all clones drive the same backlog.
///
/// - `T`: success value of every work in this scheduler
/// - `M`: opaque metadata attached at submission and returned in snapshots
pub struct Scheduler<T, M = ()> {
    inner: Arc<Inner<T, M>>,
}

impl<T, M> Clone for Scheduler<T, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, M> fmt::Debug for Scheduler<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("cfg", &self.inner.cfg)
            .finish_non_exhaustive()
    }
}

impl<T, M> Scheduler<T, M>
where
    T: Clone + Send + 'static,
    M: Clone + Send + 'static,
{
    /// Returns a builder for strategies, callbacks and subscribers.
    pub fn builder(cfg: SchedulerConfig) -> SchedulerBuilder<T, M> {
        SchedulerBuilder::new(cfg)
    }

    /// Builds a scheduler with the default strategy and no observers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(cfg: SchedulerConfig) -> Result<Self, ConfigError> {
        Self::builder(cfg).build()
    }

    pub(crate) fn new_internal(
        cfg: SchedulerConfig,
        strategy: Arc<dyn FailureStrategy>,
        callbacks: Callbacks<T, M>,
        bus: Bus,
        rt: Handle,
        runtime_token: CancellationToken,
    ) -> Self {
        let observed = !callbacks.is_empty();
        let (completion, _) = watch::channel(Completion::Pending);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::new(cfg.auto_start)),
                cfg,
                strategy,
                callbacks: RwLock::new(callbacks),
                outbox: Outbox::default(),
                observed: AtomicBool::new(observed),
                bus,
                rt,
                runtime_token,
                completion,
            }),
        }
    }

    /// Appends a pending record.
    ///
    /// Returns `None` once the scheduler is stopped or destroyed.
    pub fn submit(&self, work: WorkRef<T>) -> Option<TaskId> {
        self.inner.submit_many([(work, None)]).pop()
    }

    /// Appends a pending record carrying `meta`.
    pub fn submit_with_meta(&self, work: WorkRef<T>, meta: M) -> Option<TaskId> {
        self.inner.submit_many([(work, Some(meta))]).pop()
    }

    /// Appends a batch of records in order.
    ///
    /// Returns an empty vector once the scheduler is stopped or destroyed.
    pub fn submit_all<I>(&self, works: I) -> Vec<TaskId>
    where
        I: IntoIterator<Item = WorkRef<T>>,
    {
        self.inner
            .submit_many(works.into_iter().map(|w| (w, None)))
    }

    /// Appends a batch of `(work, meta)` pairs in order.
    pub fn submit_all_with_meta<I>(&self, works: I) -> Vec<TaskId>
    where
        I: IntoIterator<Item = (WorkRef<T>, M)>,
    {
        self.inner
            .submit_many(works.into_iter().map(|(w, m)| (w, Some(m))))
    }

    /// Enables admission (clears a pause) and admits pending records.
    pub fn start(&self) {
        self.inner.start();
    }

    /// Suspends admission; in-flight attempts continue.
    pub fn pause(&self) {
        self.inner.pause();
    }

    /// Lifts a pause and admits pending records.
    pub fn resume(&self) {
        self.inner.resume();
    }

    /// Closes the scheduler: pending records become `Stopped`, running ones finish.
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// Tears the scheduler down.
    ///
    /// Pending records become `Cancelled`, running attempts get their token triggered
    /// and are recorded as `Cancelled` at once, callbacks are released and the backlog
    /// is frozen. Idempotent.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    /// Returns an independent copy of the scheduler state.
    pub fn snapshot(&self) -> Snapshot<T, M> {
        self.inner.lock().snapshot()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.inner.lock().lifecycle.phase()
    }

    /// Returns `true` after [`destroy`](Self::destroy).
    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().lifecycle.is_destroyed()
    }

    /// Subscribes to the event bus.
    ///
    /// Receivers see only events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Waits until the all-complete notification fires (or the scheduler is destroyed)
    /// and returns a snapshot taken right after.
    ///
    /// Resolves immediately if that already happened. Never resolves for a scheduler
    /// that receives no submissions and is not destroyed.
    pub async fn wait_all_complete(&self) -> Snapshot<T, M> {
        let mut rx = self.inner.completion.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = rx.wait_for(|c| *c != Completion::Pending).await;
        self.snapshot()
    }
}

impl<T, M> Inner<T, M>
where
    T: Clone + Send + 'static,
    M: Clone + Send + 'static,
{
    fn lock(&self) -> MutexGuard<'_, State<T, M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn observed(&self) -> bool {
        self.observed.load(Ordering::Relaxed)
    }

    fn submit_many<I>(self: &Arc<Self>, items: I) -> Vec<TaskId>
    where
        I: IntoIterator<Item = (WorkRef<T>, Option<M>)>,
    {
        let mut fx = Effects::default();
        let mut st = self.lock();
        if !st.lifecycle.accepts() {
            tracing::trace!("submission rejected: scheduler closed");
            return Vec::new();
        }
        let ids: Vec<TaskId> = items
            .into_iter()
            .map(|(work, meta)| {
                let (id, index) = st.push(work, meta);
                tracing::trace!(task = %id, index, "submitted");
                self.bus
                    .publish(Event::for_task(EventKind::TaskSubmitted, id, index));
                id
            })
            .collect();
        self.admit(&mut st, &mut fx);
        self.flush(st, fx);
        ids
    }

    fn start(self: &Arc<Self>) {
        let mut fx = Effects::default();
        let mut st = self.lock();
        if !st.lifecycle.start() {
            return;
        }
        tracing::debug!("scheduler started");
        self.bus.publish(Event::new(EventKind::SchedulerStarted));
        self.admit(&mut st, &mut fx);
        self.flush(st, fx);
    }

    fn pause(&self) {
        let mut st = self.lock();
        if st.lifecycle.pause() {
            tracing::debug!(running = st.running, "scheduler paused");
            self.bus.publish(Event::new(EventKind::SchedulerPaused));
        }
    }

    fn resume(self: &Arc<Self>) {
        let mut fx = Effects::default();
        let mut st = self.lock();
        if !st.lifecycle.resume() {
            return;
        }
        tracing::debug!(pending = st.pending.len(), "scheduler resumed");
        self.bus.publish(Event::new(EventKind::SchedulerResumed));
        self.admit(&mut st, &mut fx);
        self.flush(st, fx);
    }

    fn stop(self: &Arc<Self>) {
        let mut fx = Effects::default();
        let mut st = self.lock();
        if !st.lifecycle.stop() {
            return;
        }
        tracing::debug!(
            pending = st.pending.len(),
            running = st.running,
            "scheduler stopped"
        );
        self.bus.publish(Event::new(EventKind::SchedulerStopped));
        self.sweep(&mut st, TaskStatus::Stopped, &mut fx);
        self.check_all_complete(&mut st, &mut fx);
        self.flush(st, fx);
    }

    fn destroy(&self) {
        let tokens = {
            let mut st = self.lock();
            if !st.lifecycle.destroy() {
                return;
            }
            self.observed.store(false, Ordering::Relaxed);
            *self
                .callbacks
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Callbacks::default();

            let running = st.running_tokens();
            let mut fx = Effects::default();
            for (index, _) in &running {
                self.complete(
                    &mut st,
                    *index,
                    TaskStatus::Cancelled,
                    None,
                    Some(TaskError::Canceled),
                    &mut fx,
                );
            }
            self.sweep(&mut st, TaskStatus::Cancelled, &mut fx);
            tracing::debug!(
                aborted = running.len(),
                total = st.entries.len(),
                "scheduler destroyed"
            );
            running.into_iter().map(|(_, token)| token).collect::<Vec<_>>()
        };

        // Observers of a token may call back into the scheduler.
        for token in tokens {
            token.cancel(CancelReason::Destroyed);
        }
        self.bus.publish(Event::new(EventKind::SchedulerDestroyed));
        self.completion.send_replace(Completion::Destroyed);
        self.runtime_token.cancel();
    }

    /// Admits pending records while a slot is free and admission is allowed.
    fn admit(&self, st: &mut State<T, M>, fx: &mut Effects<T, M>) {
        while st.running < self.cfg.concurrency && st.lifecycle.can_admit() {
            let Some(launch) = st.begin_next() else {
                break;
            };
            let retries = st.entries[launch.index].record.retries;
            tracing::trace!(
                task = %launch.id,
                index = launch.index,
                attempt = launch.attempt,
                running = st.running,
                "admitted"
            );
            self.bus.publish(
                Event::for_task(EventKind::TaskStarting, launch.id, launch.index)
                    .with_attempt(launch.attempt)
                    .with_retries(retries),
            );
            fx.launches.push(launch);
        }
    }

    /// Moves every pending record to `status`.
    fn sweep(&self, st: &mut State<T, M>, status: TaskStatus, fx: &mut Effects<T, M>) {
        while let Some(index) = st.pending.pop_front() {
            self.complete(st, index, status, None, None, fx);
        }
    }

    /// Settles entry `index` into a terminal `status` and records the notification.
    fn complete(
        &self,
        st: &mut State<T, M>,
        index: usize,
        status: TaskStatus,
        result: Option<T>,
        error: Option<TaskError>,
        fx: &mut Effects<T, M>,
    ) {
        let reason = error.as_ref().map(TaskError::as_message);
        st.finish(index, status, result, error);

        let rec = &st.entries[index].record;
        tracing::debug!(task = %rec.id, index, status = %status, retries = rec.retries, "settled");
        let mut ev = Event::for_task(EventKind::TaskCompleted, rec.id, index)
            .with_attempt(rec.attempts)
            .with_retries(rec.retries)
            .with_status(status);
        if let Some(reason) = reason {
            ev = ev.with_reason(reason);
        }
        self.bus.publish(ev);

        if self.observed() {
            fx.notices
                .push(Notice::TaskComplete(st.record(index), st.snapshot()));
        }
    }

    /// Fires the all-complete notification the first time the backlog is terminal.
    fn check_all_complete(&self, st: &mut State<T, M>, fx: &mut Effects<T, M>) {
        if st.all_complete_fired || st.lifecycle.is_destroyed() || !st.is_all_complete() {
            return;
        }
        st.all_complete_fired = true;
        tracing::debug!(
            total = st.entries.len(),
            success = st.success,
            "all records settled"
        );
        self.bus.publish(Event::new(EventKind::AllCompleted));
        if self.observed() {
            fx.notices.push(Notice::AllComplete(st.snapshot()));
        }
        fx.all_complete = true;
    }

    /// Applies the outcome of attempt `attempt` of entry `index`.
    fn settle(self: &Arc<Self>, index: usize, attempt: u32, outcome: AttemptOutcome<T>) {
        let mut fx = Effects::default();
        let mut st = self.lock();
        if st.lifecycle.is_destroyed() || !st.is_current(index, attempt) {
            tracing::trace!(index, attempt, "stale settlement ignored");
            return;
        }

        let AttemptOutcome { result, timed_out } = outcome;
        match result {
            Ok(value) if !timed_out => {
                self.complete(&mut st, index, TaskStatus::Success, Some(value), None, &mut fx);
            }
            Ok(_) => {
                let error = TaskError::Timeout {
                    timeout: self.cfg.timeout,
                };
                self.on_failure(&mut st, index, attempt, error, true, &mut fx);
            }
            Err(error) => {
                self.on_failure(&mut st, index, attempt, error, timed_out, &mut fx);
            }
        }

        self.admit(&mut st, &mut fx);
        self.check_all_complete(&mut st, &mut fx);
        self.flush(st, fx);
    }

    /// Routes a failed attempt through the failure strategy.
    fn on_failure(
        &self,
        st: &mut State<T, M>,
        index: usize,
        attempt: u32,
        error: TaskError,
        timed_out: bool,
        fx: &mut Effects<T, M>,
    ) {
        let rec = &st.entries[index].record;
        let id = rec.id;
        let action = self.strategy.decide(&FailureContext {
            id,
            index,
            retries: rec.retries,
            attempt,
            error: &error,
            is_timeout: timed_out,
        });

        let stored = if timed_out {
            TaskError::Timeout {
                timeout: self.cfg.timeout,
            }
        } else {
            error
        };

        match action {
            FailureAction::Retry => {
                st.requeue(index);
                let retries = st.entries[index].record.retries;
                tracing::debug!(task = %id, index, attempt, retries, error = %stored, "retrying");
                self.bus.publish(
                    Event::for_task(EventKind::TaskRetrying, id, index)
                        .with_attempt(attempt)
                        .with_retries(retries)
                        .with_reason(stored.as_message()),
                );
                if st.lifecycle.is_stopped() {
                    self.sweep(st, TaskStatus::Stopped, fx);
                }
            }
            FailureAction::Timeout => {
                self.complete(st, index, TaskStatus::Timeout, None, Some(stored), fx);
            }
            FailureAction::Fail => {
                self.complete(st, index, TaskStatus::Error, None, Some(stored), fx);
            }
        }
    }

    /// Stores a progress report of attempt `attempt` of entry `index`.
    fn report_progress(&self, index: usize, attempt: u32, value: f64) {
        let mut st = self.lock();
        if st.lifecycle.is_destroyed() || !st.is_current(index, attempt) {
            tracing::trace!(index, attempt, "stale progress ignored");
            return;
        }
        let rec = &mut st.entries[index].record;
        rec.progress = value;
        let id = rec.id;
        self.bus.publish(
            Event::for_task(EventKind::TaskProgress, id, index)
                .with_attempt(attempt)
                .with_progress(value),
        );
        if self.observed() {
            let notice = Notice::Progress(st.record(index), st.snapshot());
            self.outbox.post([Dispatch::Notice(notice)]);
        }
        drop(st);
        self.drain();
    }

    /// Queues collected notices while `st` is still held, releases it, spawns
    /// collected attempts and drains the outbox.
    fn flush(self: &Arc<Self>, st: MutexGuard<'_, State<T, M>>, fx: Effects<T, M>) {
        let Effects {
            launches,
            notices,
            all_complete,
        } = fx;
        let marker = all_complete.then_some(Dispatch::AllComplete);
        self.outbox
            .post(notices.into_iter().map(Dispatch::Notice).chain(marker));
        drop(st);

        for launch in launches {
            self.launch(launch);
        }
        self.drain();
    }

    /// Delivers queued notices in order. `wait_all_complete` callers wake only
    /// once every notice queued before the all-complete marker has run.
    fn drain(&self) {
        self.outbox.drain(|item| match item {
            Dispatch::Notice(notice) => {
                let callbacks = self
                    .callbacks
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                callbacks.deliver(notice);
            }
            Dispatch::AllComplete => {
                self.completion.send_if_modified(|c| {
                    if *c != Completion::Pending {
                        return false;
                    }
                    *c = Completion::AllComplete;
                    true
                });
            }
        });
    }

    /// Spawns one attempt on the scheduler's runtime.
    fn launch(self: &Arc<Self>, launch: Launch<T>) {
        let Launch {
            id,
            index,
            attempt,
            work,
            token,
        } = launch;

        let weak = Arc::downgrade(self);
        let progress: ProgressSink = Arc::new(move |value| {
            if let Some(inner) = weak.upgrade() {
                inner.report_progress(index, attempt, value);
            }
        });
        let ctx = TaskContext::new(id, index, attempt, token, progress);

        let inner = Arc::clone(self);
        self.rt.spawn(async move {
            let timeout = inner.cfg.attempt_timeout();
            let outcome = run_once(work.as_ref(), ctx, timeout, &inner.bus).await;
            inner.settle(index, attempt, outcome);
        });
    }
}
