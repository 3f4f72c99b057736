//! # Observability surface.
//!
//! Two complementary ways to observe a scheduler:
//!
//! - **Typed callbacks** ([`Callbacks`]): `on_progress`, `on_task_complete`,
//!   `on_all_complete`, invoked with full [`TaskRecord`](crate::TaskRecord)s and
//!   [`Snapshot`](crate::Snapshot)s. Set on the builder.
//! - **Event subscribers** ([`Subscribe`]): any number of independent observers fed
//!   lightweight [`Event`](crate::Event)s through the bus, each with its own queue and worker.
//!
//! ## Architecture
//! ```text
//! Scheduler core ──┬── Notice ─────► Callbacks (after lock release)
//!                  │
//!                  └── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                               ┌────┴────┐
//!                                                               ▼         ▼
//!                                                            LogWriter  Custom
//! ```

mod callbacks;
#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

pub use callbacks::{Callbacks, SnapshotHook, TaskHook};
pub(crate) use callbacks::{Dispatch, Notice, Outbox};
#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;

use std::any::Any;

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
