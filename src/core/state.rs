//! # Scheduler state guarded by the core lock.
//!
//! Owns the backlog, the pending queue and the running count. Every status change goes
//! through [`State::transition`], which checks the state machine and keeps the counters
//! consistent:
//!
//! ```text
//! entries:  [ e0 ][ e1 ][ e2 ][ e3 ][ e4 ]      (backlog, index == position)
//! pending:  VecDeque<index>  ──► front is admitted first (FIFO)
//! running:  number of entries in `Running`
//! settled:  number of entries in a terminal status
//! ```
//!
//! ## Invariants
//! - An entry is in `pending` XOR running XOR terminal.
//! - `running <= concurrency` (enforced by the admission loop).
//! - `token` is `Some` only while the entry is `Running`.

use std::collections::VecDeque;
use std::time::SystemTime;

use crate::core::lifecycle::Lifecycle;
use crate::error::TaskError;
use crate::tasks::{CancelToken, Snapshot, TaskId, TaskRecord, TaskStatus, WorkRef};

/// Backlog entry: the record plus what is needed to run it.
pub(crate) struct Entry<T, M> {
    pub record: TaskRecord<T, M>,
    pub work: WorkRef<T>,
    pub token: Option<CancelToken>,
}

/// Attempt admitted under the lock, spawned after it is released.
pub(crate) struct Launch<T> {
    pub id: TaskId,
    pub index: usize,
    pub attempt: u32,
    pub work: WorkRef<T>,
    pub token: CancelToken,
}

pub(crate) struct State<T, M> {
    pub entries: Vec<Entry<T, M>>,
    pub pending: VecDeque<usize>,
    pub running: usize,
    pub settled: usize,
    pub success: usize,
    pub lifecycle: Lifecycle,
    pub all_complete_fired: bool,
}

impl<T, M> State<T, M> {
    pub(crate) fn new(auto_start: bool) -> Self {
        Self {
            entries: Vec::new(),
            pending: VecDeque::new(),
            running: 0,
            settled: 0,
            success: 0,
            lifecycle: Lifecycle::new(auto_start),
            all_complete_fired: false,
        }
    }

    /// Appends a pending record to the backlog and the pending queue.
    pub(crate) fn push(&mut self, work: WorkRef<T>, meta: Option<M>) -> (TaskId, usize) {
        let index = self.entries.len();
        let record = TaskRecord::pending(index, meta);
        let id = record.id;
        self.entries.push(Entry {
            record,
            work,
            token: None,
        });
        self.pending.push_back(index);
        (id, index)
    }

    /// Moves entry `index` to `next`, keeping counters in sync.
    pub(crate) fn transition(&mut self, index: usize, next: TaskStatus) {
        let rec = &mut self.entries[index].record;
        let prev = rec.status;
        debug_assert!(
            prev.can_transition_to(next),
            "illegal transition {prev} -> {next} for index {index}"
        );
        rec.status = next;

        if prev == TaskStatus::Running {
            self.running -= 1;
            self.entries[index].token = None;
        }
        match next {
            TaskStatus::Running => self.running += 1,
            TaskStatus::Success => {
                self.success += 1;
                self.settled += 1;
            }
            TaskStatus::Pending => {}
            _ => self.settled += 1,
        }
    }

    /// Pops the next pending entry and marks it running with a fresh token.
    pub(crate) fn begin_next(&mut self) -> Option<Launch<T>> {
        let index = self.pending.pop_front()?;
        self.transition(index, TaskStatus::Running);

        let token = CancelToken::new();
        let entry = &mut self.entries[index];
        entry.token = Some(token.clone());
        entry.record.attempts += 1;
        entry.record.started_at = Some(SystemTime::now());
        entry.record.ended_at = None;

        Some(Launch {
            id: entry.record.id,
            index,
            attempt: entry.record.attempts,
            work: entry.work.clone(),
            token,
        })
    }

    /// Reopens a running entry for another attempt at the back of the queue.
    pub(crate) fn requeue(&mut self, index: usize) {
        self.transition(index, TaskStatus::Pending);
        self.entries[index].record.retries += 1;
        self.pending.push_back(index);
    }

    /// Moves entry `index` to a terminal `status` and fills its outcome slots.
    pub(crate) fn finish(
        &mut self,
        index: usize,
        status: TaskStatus,
        result: Option<T>,
        error: Option<TaskError>,
    ) {
        self.transition(index, status);
        let rec = &mut self.entries[index].record;
        rec.ended_at = Some(SystemTime::now());
        rec.result = result;
        rec.error = error;
    }

    /// Returns `true` if `attempt` is the in-flight attempt of entry `index`.
    pub(crate) fn is_current(&self, index: usize, attempt: u32) -> bool {
        self.entries.get(index).is_some_and(|e| {
            e.record.status == TaskStatus::Running && e.record.attempts == attempt
        })
    }

    /// Returns `true` once every submitted record is terminal.
    #[inline]
    pub(crate) fn is_all_complete(&self) -> bool {
        !self.entries.is_empty() && self.settled == self.entries.len()
    }

    /// Tokens of all in-flight attempts.
    pub(crate) fn running_tokens(&self) -> Vec<(usize, CancelToken)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.token.clone().map(|t| (i, t)))
            .collect()
    }
}

impl<T: Clone, M: Clone> State<T, M> {
    pub(crate) fn record(&self, index: usize) -> TaskRecord<T, M> {
        self.entries[index].record.clone()
    }

    pub(crate) fn snapshot(&self) -> Snapshot<T, M> {
        let tasks: Vec<TaskRecord<T, M>> =
            self.entries.iter().map(|e| e.record.clone()).collect();
        let results = tasks.iter().map(|t| t.result.clone()).collect();
        Snapshot {
            tasks,
            results,
            success_count: self.success,
            running_count: self.running,
            pending_count: self.pending.len(),
            phase: self.lifecycle.phase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{SyncWorkFn, TaskContext};
    use std::sync::Arc;

    fn work() -> WorkRef<u32> {
        Arc::new(SyncWorkFn::new(|_ctx: TaskContext| Ok::<u32, TaskError>(1)))
    }

    #[test]
    fn test_push_assigns_dense_indices() {
        let mut st: State<u32, ()> = State::new(true);
        let (a, ia) = st.push(work(), None);
        let (b, ib) = st.push(work(), None);
        assert_eq!((ia, ib), (0, 1));
        assert!(b > a);
        assert_eq!(st.pending, VecDeque::from([0, 1]));
    }

    #[test]
    fn test_begin_next_is_fifo_and_counts_running() {
        let mut st: State<u32, ()> = State::new(true);
        st.push(work(), None);
        st.push(work(), None);

        let l = st.begin_next().unwrap();
        assert_eq!(l.index, 0);
        assert_eq!(l.attempt, 1);
        assert_eq!(st.running, 1);
        assert!(st.entries[0].token.is_some());
        assert!(st.is_current(0, 1));
        assert!(!st.is_current(0, 2));
    }

    #[test]
    fn test_requeue_goes_to_back_and_bumps_retries() {
        let mut st: State<u32, ()> = State::new(true);
        st.push(work(), None);
        st.push(work(), None);
        st.begin_next().unwrap();
        st.requeue(0);

        assert_eq!(st.pending, VecDeque::from([1, 0]));
        assert_eq!(st.entries[0].record.retries, 1);
        assert_eq!(st.running, 0);
        assert!(st.entries[0].token.is_none());
    }

    #[test]
    fn test_finish_only_success_fills_result() {
        let mut st: State<u32, ()> = State::new(true);
        st.push(work(), None);
        st.push(work(), None);
        st.begin_next().unwrap();
        st.begin_next().unwrap();
        st.finish(0, TaskStatus::Success, Some(7), None);
        st.finish(1, TaskStatus::Error, None, Some(TaskError::fail("boom")));

        let snap = st.snapshot();
        assert_eq!(snap.results, vec![Some(7), None]);
        assert_eq!(snap.success_count, 1);
        assert_eq!(snap.running_count, 0);
        assert!(st.is_all_complete());
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut st: State<u32, &str> = State::new(true);
        st.push(work(), Some("a"));
        let mut snap = st.snapshot();
        snap.tasks[0].status = TaskStatus::Success;
        snap.results[0] = Some(99);
        assert_eq!(st.entries[0].record.status, TaskStatus::Pending);
        assert_eq!(st.snapshot().results, vec![None]);
        assert_eq!(st.snapshot().tasks[0].meta, Some("a"));
    }
}
