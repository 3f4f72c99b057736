//! # Typed observability callbacks.
//!
//! [`Callbacks`] holds the three optional hooks a scheduler invokes with full,
//! typed state:
//!
//! | Hook               | Fires                                                   | Receives             |
//! |--------------------|---------------------------------------------------------|----------------------|
//! | `on_progress`      | every `TaskContext::report_progress` call               | record + snapshot    |
//! | `on_task_complete` | once per record, on its terminal status (not on retry)  | record + snapshot    |
//! | `on_all_complete`  | once, the first time the whole backlog is terminal      | snapshot             |
//!
//! Hooks run outside the scheduler lock, so they may call back into the scheduler
//! (e.g. submit follow-up work). They run one at a time, in the order the scheduler
//! produced them, through an [`Outbox`]. A panicking hook is caught and logged.
//! `destroy()` releases all hooks; nothing fires afterwards.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::subscribers::panic_message;
use crate::tasks::{Snapshot, TaskRecord};

/// Hook receiving a record and a fresh snapshot.
pub type TaskHook<T, M> = Arc<dyn Fn(&TaskRecord<T, M>, &Snapshot<T, M>) + Send + Sync>;

/// Hook receiving a fresh snapshot.
pub type SnapshotHook<T, M> = Arc<dyn Fn(&Snapshot<T, M>) + Send + Sync>;

/// Set of optional hooks.
pub struct Callbacks<T, M> {
    pub(crate) on_progress: Option<TaskHook<T, M>>,
    pub(crate) on_task_complete: Option<TaskHook<T, M>>,
    pub(crate) on_all_complete: Option<SnapshotHook<T, M>>,
}

impl<T, M> Default for Callbacks<T, M> {
    fn default() -> Self {
        Self {
            on_progress: None,
            on_task_complete: None,
            on_all_complete: None,
        }
    }
}

impl<T, M> Clone for Callbacks<T, M> {
    fn clone(&self) -> Self {
        Self {
            on_progress: self.on_progress.clone(),
            on_task_complete: self.on_task_complete.clone(),
            on_all_complete: self.on_all_complete.clone(),
        }
    }
}

impl<T, M> Callbacks<T, M> {
    /// Returns `true` if no hook is set.
    pub fn is_empty(&self) -> bool {
        self.on_progress.is_none() && self.on_task_complete.is_none() && self.on_all_complete.is_none()
    }
}

impl<T, M> fmt::Debug for Callbacks<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_task_complete", &self.on_task_complete.is_some())
            .field("on_all_complete", &self.on_all_complete.is_some())
            .finish()
    }
}

/// A notification computed under the scheduler lock and delivered after it is released.
pub(crate) enum Notice<T, M> {
    Progress(TaskRecord<T, M>, Snapshot<T, M>),
    TaskComplete(TaskRecord<T, M>, Snapshot<T, M>),
    AllComplete(Snapshot<T, M>),
}

impl<T, M> Callbacks<T, M> {
    /// Runs the hook matching `notice`, isolating panics.
    pub(crate) fn deliver(&self, notice: Notice<T, M>) {
        let (hook, run): (&'static str, Box<dyn FnOnce() + '_>) = match notice {
            Notice::Progress(rec, snap) => match &self.on_progress {
                Some(f) => ("on_progress", Box::new(move || f(&rec, &snap))),
                None => return,
            },
            Notice::TaskComplete(rec, snap) => match &self.on_task_complete {
                Some(f) => ("on_task_complete", Box::new(move || f(&rec, &snap))),
                None => return,
            },
            Notice::AllComplete(snap) => match &self.on_all_complete {
                Some(f) => ("on_all_complete", Box::new(move || f(&snap))),
                None => return,
            },
        };
        if let Err(payload) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(run)) {
            tracing::warn!(hook, panic = %panic_message(&*payload), "callback panicked");
        }
    }
}

/// Entry of the delivery queue.
pub(crate) enum Dispatch<T, M> {
    Notice(Notice<T, M>),
    /// Everything queued before this marker has been delivered.
    AllComplete,
}

struct Queue<T, M> {
    items: VecDeque<Dispatch<T, M>>,
    draining: bool,
}

/// FIFO delivery queue with a single active drainer.
///
/// Entries are posted under the scheduler lock, so queue order is the order in
/// which they were produced. Whoever finds the queue idle drains it; concurrent
/// and re-entrant posters leave their entries to that drainer. Hooks therefore
/// never overlap and run in production order on any runtime flavor.
pub(crate) struct Outbox<T, M> {
    queue: Mutex<Queue<T, M>>,
}

impl<T, M> Default for Outbox<T, M> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(Queue {
                items: VecDeque::new(),
                draining: false,
            }),
        }
    }
}

impl<T, M> Outbox<T, M> {
    fn lock(&self) -> MutexGuard<'_, Queue<T, M>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `items` behind everything already queued.
    pub(crate) fn post(&self, items: impl IntoIterator<Item = Dispatch<T, M>>) {
        self.lock().items.extend(items);
    }

    /// Hands queued entries to `deliver` in order until the queue is empty.
    ///
    /// Returns at once if another caller is draining; that caller picks up
    /// whatever was posted in the meantime.
    pub(crate) fn drain(&self, mut deliver: impl FnMut(Dispatch<T, M>)) {
        {
            let mut q = self.lock();
            if q.draining || q.items.is_empty() {
                return;
            }
            q.draining = true;
        }
        let _unwind = Unwind(self);
        loop {
            let next = {
                let mut q = self.lock();
                match q.items.pop_front() {
                    Some(item) => item,
                    None => {
                        // Same critical section as the emptiness check.
                        q.draining = false;
                        return;
                    }
                }
            };
            deliver(next);
        }
    }
}

/// Clears the draining flag if a delivery unwinds.
struct Unwind<'a, T, M>(&'a Outbox<T, M>);

impl<T, M> Drop for Unwind<'_, T, M> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().draining = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Phase;

    fn empty() -> Snapshot<(), ()> {
        Snapshot {
            tasks: Vec::new(),
            results: Vec::new(),
            success_count: 0,
            running_count: 0,
            pending_count: 0,
            phase: Phase::Running,
        }
    }

    fn marker(d: &Dispatch<(), ()>) -> &'static str {
        match d {
            Dispatch::Notice(_) => "notice",
            Dispatch::AllComplete => "all",
        }
    }

    #[test]
    fn test_drain_delivers_in_post_order() {
        let outbox: Outbox<(), ()> = Outbox::default();
        outbox.post([
            Dispatch::Notice(Notice::AllComplete(empty())),
            Dispatch::AllComplete,
        ]);

        let mut seen = Vec::new();
        outbox.drain(|d| seen.push(marker(&d)));
        assert_eq!(seen, vec!["notice", "all"]);
    }

    #[test]
    fn test_reentrant_posts_are_left_to_the_active_drainer() {
        let outbox: Outbox<(), ()> = Outbox::default();
        outbox.post([Dispatch::AllComplete]);

        let mut seen = Vec::new();
        let mut nested_calls = 0;
        outbox.drain(|d| {
            seen.push(marker(&d));
            if seen.len() == 1 {
                outbox.post([Dispatch::Notice(Notice::AllComplete(empty()))]);
                outbox.drain(|_| nested_calls += 1);
            }
        });
        assert_eq!(nested_calls, 0);
        assert_eq!(seen, vec!["all", "notice"]);
    }

    #[test]
    fn test_drainer_flag_resets_after_unwind() {
        let outbox: Outbox<(), ()> = Outbox::default();
        outbox.post([Dispatch::AllComplete, Dispatch::AllComplete]);
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            outbox.drain(|_| panic!("boom"));
        }));
        assert!(res.is_err());

        let mut left = 0;
        outbox.drain(|_| left += 1);
        assert_eq!(left, 1);
    }

    #[test]
    fn test_deliver_isolates_panicking_hook() {
        let cb: Callbacks<(), ()> = Callbacks {
            on_all_complete: Some(Arc::new(|_snap| panic!("hook bug"))),
            ..Callbacks::default()
        };
        cb.deliver(Notice::AllComplete(empty()));
    }
}
