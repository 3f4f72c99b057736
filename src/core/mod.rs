//! Scheduler core: admission, attempts and lifecycle.
//!
//! The public API from this module is [`Scheduler`] (with [`SchedulerBuilder`]),
//! its [`SchedulerConfig`] and the observable [`Phase`].
//!
//! Internal modules:
//! - [`runner`]: executes one attempt with timer/cancellation and panic capture;
//! - [`state`]: backlog, pending queue and counters guarded by the scheduler lock;
//! - [`lifecycle`]: start/pause/resume/stop/destroy flags;
//! - [`scheduler`]: admission loop, settlement and failure routing;
//! - [`builder`]: wiring of strategy, callbacks, bus and subscribers.

mod builder;
mod config;
mod lifecycle;
mod runner;
mod scheduler;
mod state;

pub use builder::SchedulerBuilder;
pub use config::SchedulerConfig;
pub use lifecycle::Phase;
pub use scheduler::Scheduler;
