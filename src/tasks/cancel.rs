//! # Per-attempt cancellation token.
//!
//! [`CancelToken`] wraps a [`CancellationToken`] and remembers **why** it was
//! triggered. The scheduler creates a fresh token for every attempt (retries included)
//! and triggers it when:
//! - the attempt's timer expires → [`CancelReason::Timeout`]
//! - the scheduler is destroyed → [`CancelReason::Destroyed`]
//!
//! ## Rules
//! - Triggering is **idempotent**: the first reason wins, later calls are no-ops.
//! - Observers registered with [`CancelToken::on_cancel`] run exactly once, on the
//!   triggering thread, or immediately if the token is already triggered.
//! - Cancellation is cooperative: work that never looks at the token keeps running.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Why a token was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Per-attempt timer expired.
    Timeout,
    /// Scheduler was destroyed while the attempt was in flight.
    Destroyed,
}

type Observer = Box<dyn FnOnce(CancelReason) + Send>;

struct Inner {
    token: CancellationToken,
    reason: OnceLock<CancelReason>,
    observers: Mutex<Vec<Observer>>,
}

/// Cloneable cancellation signal for a single attempt.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use taskpool::{CancelReason, CancelToken};
///
/// let token = CancelToken::new();
/// let seen = Arc::new(AtomicBool::new(false));
/// let flag = seen.clone();
/// token.on_cancel(move |_| flag.store(true, Ordering::SeqCst));
///
/// assert!(token.cancel(CancelReason::Timeout));
/// assert!(!token.cancel(CancelReason::Destroyed)); // first reason wins
/// assert_eq!(token.reason(), Some(CancelReason::Timeout));
/// assert!(seen.load(Ordering::SeqCst));
/// ```
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                token: CancellationToken::new(),
                reason: OnceLock::new(),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Triggers the token with `reason`.
    ///
    /// Returns `true` if this call triggered it, `false` if it was already triggered.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        if self.inner.reason.set(reason).is_err() {
            return false;
        }
        self.inner.token.cancel();

        let observers = std::mem::take(
            &mut *self
                .inner
                .observers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for observer in observers {
            observer(reason);
        }
        true
    }

    /// Returns `true` once the token has been triggered.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.get().is_some()
    }

    /// Returns the reason the token was triggered with, if any.
    #[inline]
    pub fn reason(&self) -> Option<CancelReason> {
        self.inner.reason.get().copied()
    }

    /// Completes when the token is triggered.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.token.cancelled()
    }

    /// Underlying tokio-util token, for handing to libraries that expect one.
    ///
    /// Cancelling the returned token directly does not record a reason.
    pub fn as_token(&self) -> &CancellationToken {
        &self.inner.token
    }

    /// Registers an observer that runs once when the token is triggered.
    ///
    /// If the token is already triggered, `f` runs immediately on the caller's thread.
    pub fn on_cancel<F>(&self, f: F)
    where
        F: FnOnce(CancelReason) + Send + 'static,
    {
        let mut observers = self
            .inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match self.inner.reason.get().copied() {
            Some(reason) => {
                drop(observers);
                f(reason);
            }
            None => observers.push(Box::new(f)),
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .finish()
    }
}
