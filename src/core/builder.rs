use std::sync::Arc;

use tokio::{runtime::Handle, select, sync::broadcast::error::RecvError};
use tokio_util::sync::CancellationToken;

use super::{config::SchedulerConfig, scheduler::Scheduler};
use crate::{
    error::ConfigError,
    events::Bus,
    policies::{DefaultStrategy, FailureStrategy},
    subscribers::{Callbacks, Subscribe, SubscriberSet},
    tasks::{Snapshot, TaskRecord},
};

/// Builder for constructing a [`Scheduler`] with optional features.
pub struct SchedulerBuilder<T, M = ()> {
    cfg: SchedulerConfig,
    strategy: Option<Arc<dyn FailureStrategy>>,
    callbacks: Callbacks<T, M>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<T, M> SchedulerBuilder<T, M>
where
    T: Clone + Send + 'static,
    M: Clone + Send + 'static,
{
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SchedulerConfig) -> Self {
        Self {
            cfg,
            strategy: None,
            callbacks: Callbacks::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the default failure strategy.
    ///
    /// Without this, [`DefaultStrategy`] parameterized by `cfg.retry` is used.
    pub fn with_failure_strategy<S: FailureStrategy>(mut self, strategy: S) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Sets the hook invoked on every progress report.
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(&TaskRecord<T, M>, &Snapshot<T, M>) + Send + Sync + 'static,
    {
        self.callbacks.on_progress = Some(Arc::new(f));
        self
    }

    /// Sets the hook invoked once per record when it reaches a terminal status.
    pub fn on_task_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&TaskRecord<T, M>, &Snapshot<T, M>) + Send + Sync + 'static,
    {
        self.callbacks.on_task_complete = Some(Arc::new(f));
        self
    }

    /// Sets the hook invoked the first time the whole backlog is terminal.
    pub fn on_all_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&Snapshot<T, M>) + Send + Sync + 'static,
    {
        self.callbacks.on_all_complete = Some(Arc::new(f));
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive scheduler events (submission, attempts, retries,
    /// settlements, lifecycle) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the scheduler.
    ///
    /// Captures the current tokio runtime; attempts and subscriber workers are
    /// spawned on it.
    ///
    /// # Errors
    /// - [`ConfigError::ZeroConcurrency`] if `cfg.concurrency == 0`
    /// - [`ConfigError::NoRuntime`] if called outside a tokio runtime
    pub fn build(self) -> Result<Scheduler<T, M>, ConfigError> {
        self.cfg.validate()?;
        let rt = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();
        let strategy: Arc<dyn FailureStrategy> = match self.strategy {
            Some(s) => s,
            None => Arc::new(DefaultStrategy::new(self.cfg.retry)),
        };

        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone(), &rt);
            subscriber_listener(&rt, &bus, subs, runtime_token.clone());
        }

        Ok(Scheduler::new_internal(
            self.cfg,
            strategy,
            self.callbacks,
            bus,
            rt,
            runtime_token,
        ))
    }
}

/// Forwards bus events to the subscriber set until the scheduler is destroyed or dropped.
fn subscriber_listener(rt: &Handle, bus: &Bus, subs: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    rt.spawn(async move {
        loop {
            select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => {
                        let last = ev.is_terminal_for_scheduler();
                        subs.emit(ev);
                        if last {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{FailureAction, FailureContext};

    #[test]
    fn test_build_outside_runtime_fails() {
        let res = SchedulerBuilder::<u8>::new(SchedulerConfig::default()).build();
        assert!(matches!(res, Err(ConfigError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_zero_concurrency_fails() {
        let cfg = SchedulerConfig {
            concurrency: 0,
            ..SchedulerConfig::default()
        };
        let res = SchedulerBuilder::<u8>::new(cfg).build();
        assert!(matches!(res, Err(ConfigError::ZeroConcurrency)));
    }

    #[tokio::test]
    async fn test_custom_strategy_and_hooks_are_accepted() {
        let sched = SchedulerBuilder::<u8, &'static str>::new(SchedulerConfig::default())
            .with_failure_strategy(|_ctx: &FailureContext<'_>| FailureAction::Fail)
            .on_progress(|_rec, _snap| {})
            .on_task_complete(|_rec, _snap| {})
            .on_all_complete(|_snap| {})
            .build();
        assert!(sched.is_ok());
    }
}
