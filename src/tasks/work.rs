//! # Units of work and function-backed adapters.
//!
//! This module defines the [`Work`] trait and two closure adapters:
//! - [`WorkFn`] wraps `F: Fn(TaskContext) -> Fut`, producing a fresh future per attempt;
//! - [`SyncWorkFn`] wraps `F: Fn(TaskContext) -> Result<T, TaskError>` for work that
//!   settles immediately.
//!
//! The shared handle type is [`WorkRef`], an `Arc<dyn Work<T>>`.
//!
//! ## Concurrency semantics
//! - Every attempt (retries included) calls [`Work::run`] again and gets a **new** future.
//! - There is no hidden mutation between attempts; share state explicitly with `Arc<...>`
//!   inside the closure if you need it.
//! - A panic while creating or polling the future is reported as
//!   [`TaskError::Panicked`](crate::TaskError::Panicked).
//!
//! ## Example
//! ```rust
//! use taskpool::{TaskContext, TaskError, WorkFn, WorkRef};
//!
//! let w: WorkRef<u32> = WorkFn::arc(|ctx: TaskContext| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     ctx.report_progress(1.0);
//!     Ok(42)
//! });
//! # let _ = w;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::context::TaskContext;

/// Boxed future returned by [`Work::run`].
pub type BoxWorkFuture<T> = Pin<Box<dyn Future<Output = Result<T, TaskError>> + Send + 'static>>;

/// Shared handle to a unit of work.
pub type WorkRef<T> = Arc<dyn Work<T>>;

/// # Asynchronous, cancelable unit of work producing a `T`.
///
/// Implementations should watch [`TaskContext::cancelled`] and return promptly
/// (usually with [`TaskError::Canceled`]) once the attempt is asked to stop.
///
/// # Example
/// ```
/// use taskpool::{BoxWorkFuture, TaskContext, TaskError, Work};
///
/// struct Fetch { url: String }
///
/// impl Work<usize> for Fetch {
///     fn run(&self, ctx: TaskContext) -> BoxWorkFuture<usize> {
///         let len = self.url.len();
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(TaskError::Canceled);
///             }
///             Ok(len)
///         })
///     }
/// }
/// ```
pub trait Work<T>: Send + Sync + 'static {
    /// Creates the future for one attempt.
    fn run(&self, ctx: TaskContext) -> BoxWorkFuture<T>;
}

impl<T: 'static> Work<T> for Arc<dyn Work<T>> {
    fn run(&self, ctx: TaskContext) -> BoxWorkFuture<T> {
        self.as_ref().run(ctx)
    }
}

/// Async-closure-backed work.
#[derive(Debug, Clone)]
pub struct WorkFn<F> {
    f: F,
}

impl<F> WorkFn<F> {
    /// Wraps `f`.
    ///
    /// Prefer [`WorkFn::arc`] when you immediately need a [`WorkRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps `f` and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<T, F, Fut> Work<T> for WorkFn<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
{
    fn run(&self, ctx: TaskContext) -> BoxWorkFuture<T> {
        Box::pin((self.f)(ctx))
    }
}

/// Closure-backed work that settles synchronously.
///
/// ## Example
/// ```rust
/// use taskpool::{SyncWorkFn, TaskContext, TaskError, WorkRef};
///
/// let parse: WorkRef<i64> = SyncWorkFn::arc(|_ctx: TaskContext| {
///     "17".parse::<i64>().map_err(|e| TaskError::fail(e.to_string()))
/// });
/// # let _ = parse;
/// ```
#[derive(Debug, Clone)]
pub struct SyncWorkFn<F> {
    f: F,
}

impl<F> SyncWorkFn<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps `f` and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<T, F> Work<T> for SyncWorkFn<F>
where
    T: Send + 'static,
    F: Fn(TaskContext) -> Result<T, TaskError> + Send + Sync + 'static,
{
    fn run(&self, ctx: TaskContext) -> BoxWorkFuture<T> {
        Box::pin(std::future::ready((self.f)(ctx)))
    }
}
