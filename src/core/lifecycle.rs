//! # Lifecycle controller.
//!
//! Pause/resume/stop/destroy state machine layered over admission.
//!
//! ```text
//!            start()            pause()
//!   Idle ─────────────► Running ◄──────► Paused
//!    │                     │    resume()    │
//!    │  stop()             │ stop()         │ stop()
//!    └──────────────► Stopped ◄─────────────┘
//!                        │ destroy() (from any phase)
//!                        ▼
//!                    Destroyed
//! ```
//!
//! ## Rules
//! - Admission requires `started && !paused && !stopped`.
//! - `stop()` and `destroy()` are one-way; `destroy()` implies stopped.
//! - `resume()` before `start()` only clears the pause flag.

/// Observable lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Built with `auto_start = false` and not started yet.
    Idle,
    /// Admitting work.
    Running,
    /// Admission suspended; in-flight attempts continue.
    Paused,
    /// Closed for submissions; in-flight attempts continue.
    Stopped,
    /// Torn down; state is frozen.
    Destroyed,
}

impl Phase {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Paused => "paused",
            Phase::Stopped => "stopped",
            Phase::Destroyed => "destroyed",
        }
    }
}

/// Lifecycle flags guarded by the scheduler lock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lifecycle {
    started: bool,
    paused: bool,
    stopped: bool,
    destroyed: bool,
}

impl Lifecycle {
    pub(crate) fn new(auto_start: bool) -> Self {
        Self {
            started: auto_start,
            paused: false,
            stopped: false,
            destroyed: false,
        }
    }

    #[inline]
    pub(crate) fn can_admit(&self) -> bool {
        self.started && !self.paused && !self.stopped
    }

    /// Open for submissions.
    #[inline]
    pub(crate) fn accepts(&self) -> bool {
        !self.stopped
    }

    #[inline]
    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }

    #[inline]
    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Returns `false` if the call changed nothing.
    pub(crate) fn start(&mut self) -> bool {
        if self.stopped || (self.started && !self.paused) {
            return false;
        }
        self.started = true;
        self.paused = false;
        true
    }

    pub(crate) fn pause(&mut self) -> bool {
        if self.stopped || self.paused {
            return false;
        }
        self.paused = true;
        true
    }

    pub(crate) fn resume(&mut self) -> bool {
        if self.stopped || !self.paused {
            return false;
        }
        self.paused = false;
        true
    }

    pub(crate) fn stop(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.stopped = true;
        true
    }

    pub(crate) fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.stopped = true;
        self.destroyed = true;
        true
    }

    pub(crate) fn phase(&self) -> Phase {
        if self.destroyed {
            Phase::Destroyed
        } else if self.stopped {
            Phase::Stopped
        } else if self.paused {
            Phase::Paused
        } else if self.started {
            Phase::Running
        } else {
            Phase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_start_admits_immediately() {
        let lc = Lifecycle::new(true);
        assert!(lc.can_admit());
        assert_eq!(lc.phase(), Phase::Running);
    }

    #[test]
    fn test_manual_start_gates_admission() {
        let mut lc = Lifecycle::new(false);
        assert!(!lc.can_admit());
        assert_eq!(lc.phase(), Phase::Idle);
        assert!(lc.start());
        assert!(lc.can_admit());
        assert!(!lc.start());
    }

    #[test]
    fn test_resume_before_start_only_clears_pause() {
        let mut lc = Lifecycle::new(false);
        assert!(lc.pause());
        assert!(lc.resume());
        assert!(!lc.can_admit());
        assert_eq!(lc.phase(), Phase::Idle);
    }

    #[test]
    fn test_pause_blocks_admission() {
        let mut lc = Lifecycle::new(true);
        assert!(lc.pause());
        assert!(!lc.pause());
        assert!(!lc.can_admit());
        assert_eq!(lc.phase(), Phase::Paused);
        assert!(lc.resume());
        assert!(lc.can_admit());
    }

    #[test]
    fn test_stop_is_one_way() {
        let mut lc = Lifecycle::new(true);
        assert!(lc.stop());
        assert!(!lc.stop());
        assert!(!lc.start());
        assert!(!lc.resume());
        assert!(!lc.accepts());
        assert!(!lc.can_admit());
        assert_eq!(lc.phase(), Phase::Stopped);
    }

    #[test]
    fn test_destroy_is_idempotent_and_implies_stop() {
        let mut lc = Lifecycle::new(true);
        assert!(lc.destroy());
        assert!(!lc.destroy());
        assert!(lc.is_stopped());
        assert!(lc.is_destroyed());
        assert_eq!(lc.phase(), Phase::Destroyed);
    }
}
