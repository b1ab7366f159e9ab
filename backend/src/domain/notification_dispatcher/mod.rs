//! Bounded asynchronous notification dispatcher.
//!
//! A fixed pool of Tokio workers drains a bounded queue of
//! [`NotificationJob`]s. Submission never waits: when the queue is full the
//! job is dropped and counted. Each worker handles one job at a time; with
//! more than one worker, completion order is not submission order.
//!
//! Lifecycle: `Stopped -> Running -> Draining -> Stopped`. [`stop`] closes
//! the queue and hands the workers to a detached reaper task that joins them
//! and moves the dispatcher to `Stopped`. Callers bound shutdown with their
//! own timeout; if the `stop` future is abandoned the reaper still finishes,
//! so the dispatcher reaches `Stopped` once the queue drains and can be
//! started again.
//!
//! Delivery is best-effort. A job whose delivery fails or panics is logged,
//! counted as failed and discarded. There is no retry and no dead-letter
//! queue.
//!
//! [`stop`]: NotificationDispatcher::stop

mod stats;

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::FutureExt;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::NotificationJob;
use crate::domain::ports::{
    DispatchMetrics, DispatchOutcome, DropReason, NoOpDispatchMetrics, NotificationDelivery,
    NotificationQueue, SubmitOutcome,
};

pub use stats::DispatchStats;
use stats::StatsCounters;

/// Default bound on queued-but-unclaimed jobs.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Dispatcher tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum number of jobs waiting for a worker.
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// No workers; submissions are dropped.
    Stopped,
    /// Workers are consuming the queue.
    Running,
    /// Stop requested; workers finish queued jobs.
    Draining,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Draining => "draining",
        })
    }
}

/// Errors returned by [`NotificationDispatcher::start`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatcherError {
    /// `start` was called while the dispatcher was not stopped.
    #[error("dispatcher cannot start while {state}")]
    NotStopped {
        /// State observed when `start` was called.
        state: DispatcherState,
    },
    /// A pool needs at least one worker.
    #[error("worker count must be greater than zero")]
    NoWorkers,
    /// The queue needs at least one slot.
    #[error("queue capacity must be greater than zero")]
    ZeroQueueCapacity,
    /// `start` was called outside a Tokio runtime.
    #[error("dispatcher must be started from within a Tokio runtime")]
    NoRuntime,
}

struct Pool {
    runtime: tokio::runtime::Handle,
    sender: mpsc::Sender<NotificationJob>,
    workers: Vec<JoinHandle<()>>,
}

enum Lifecycle {
    Stopped,
    Running(Pool),
    Draining,
}

impl Lifecycle {
    fn state(&self) -> DispatcherState {
        match self {
            Self::Stopped => DispatcherState::Stopped,
            Self::Running(_) => DispatcherState::Running,
            Self::Draining => DispatcherState::Draining,
        }
    }
}

/// Everything a worker needs, shared across the pool.
struct WorkerContext {
    delivery: Arc<dyn NotificationDelivery>,
    metrics: Arc<dyn DispatchMetrics>,
    stats: Arc<StatsCounters>,
}

impl WorkerContext {
    fn record(&self, outcome: DispatchOutcome) {
        record_metric(self.metrics.as_ref(), outcome);
    }
}

fn lock_lifecycle(lifecycle: &Mutex<Lifecycle>) -> MutexGuard<'_, Lifecycle> {
    // Lifecycle transitions never leave the enum half-written, so a poisoned
    // guard is still consistent.
    lifecycle
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn record_metric(metrics: &dyn DispatchMetrics, outcome: DispatchOutcome) {
    if let Err(err) = metrics.record(outcome) {
        debug!(outcome = outcome.as_label(), error = %err, "failed to record dispatch metric");
    }
}

/// Bounded worker pool delivering notification jobs.
///
/// Construct once at startup, [`start`](Self::start) it, share it behind an
/// `Arc` with whatever submits jobs, and [`stop`](Self::stop) it during
/// shutdown.
pub struct NotificationDispatcher {
    config: DispatcherConfig,
    context: Arc<WorkerContext>,
    lifecycle: Arc<Mutex<Lifecycle>>,
}

impl NotificationDispatcher {
    /// Create a stopped dispatcher that delivers through `delivery`.
    pub fn new(delivery: Arc<dyn NotificationDelivery>, config: DispatcherConfig) -> Self {
        Self {
            config,
            context: Arc::new(WorkerContext {
                delivery,
                metrics: Arc::new(NoOpDispatchMetrics),
                stats: Arc::new(StatsCounters::default()),
            }),
            lifecycle: Arc::new(Mutex::new(Lifecycle::Stopped)),
        }
    }

    /// Record outcomes through `metrics` as well as the internal counters.
    #[must_use]
    pub fn with_metrics(self, metrics: Arc<dyn DispatchMetrics>) -> Self {
        let Self {
            config,
            context,
            lifecycle,
        } = self;
        Self {
            config,
            context: Arc::new(WorkerContext {
                delivery: Arc::clone(&context.delivery),
                metrics,
                stats: Arc::clone(&context.stats),
            }),
            lifecycle,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        lock_lifecycle(&self.lifecycle)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        self.lock().state()
    }

    /// Snapshot of the dispatch counters.
    pub fn stats(&self) -> DispatchStats {
        self.context.stats.snapshot()
    }

    /// Spawn `worker_count` workers and begin accepting jobs.
    ///
    /// # Errors
    ///
    /// Fails when the dispatcher is not stopped, when `worker_count` or the
    /// configured queue capacity is zero, or outside a Tokio runtime.
    pub fn start(&self, worker_count: usize) -> Result<(), DispatcherError> {
        if worker_count == 0 {
            return Err(DispatcherError::NoWorkers);
        }
        if self.config.queue_capacity == 0 {
            return Err(DispatcherError::ZeroQueueCapacity);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| DispatcherError::NoRuntime)?;

        let mut lifecycle = self.lock();
        if !matches!(*lifecycle, Lifecycle::Stopped) {
            return Err(DispatcherError::NotStopped {
                state: lifecycle.state(),
            });
        }

        let (sender, receiver) = mpsc::channel(self.config.queue_capacity);
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let workers = (0..worker_count)
            .map(|worker| {
                runtime.spawn(run_worker(
                    worker,
                    Arc::clone(&receiver),
                    Arc::clone(&self.context),
                ))
            })
            .collect();

        *lifecycle = Lifecycle::Running(Pool {
            runtime,
            sender,
            workers,
        });
        info!(
            workers = worker_count,
            queue_capacity = self.config.queue_capacity,
            "notification dispatcher started"
        );
        Ok(())
    }

    /// Enqueue `job` without waiting.
    ///
    /// Returns [`SubmitOutcome::Dropped`] when the queue is full or the
    /// dispatcher is not running. Drops are counted and logged.
    pub fn submit(&self, job: NotificationJob) -> SubmitOutcome {
        let notification_id = job.notification.id();
        let outcome = match &*self.lock() {
            Lifecycle::Running(pool) => match pool.sender.try_send(job) {
                Ok(()) => SubmitOutcome::Accepted,
                Err(TrySendError::Full(_)) => SubmitOutcome::Dropped(DropReason::QueueFull),
                Err(TrySendError::Closed(_)) => SubmitOutcome::Dropped(DropReason::NotRunning),
            },
            Lifecycle::Stopped | Lifecycle::Draining => {
                SubmitOutcome::Dropped(DropReason::NotRunning)
            }
        };

        match outcome {
            SubmitOutcome::Accepted => {
                self.context.stats.record_accepted();
                self.context.record(DispatchOutcome::Accepted);
                debug!(%notification_id, "notification job queued");
            }
            SubmitOutcome::Dropped(reason) => {
                self.context.stats.record_dropped();
                self.context.record(DispatchOutcome::Dropped);
                warn!(
                    %notification_id,
                    reason = reason.as_str(),
                    "notification job dropped"
                );
            }
        }
        outcome
    }

    /// Stop accepting jobs, wait for queued jobs to be processed and join
    /// every worker.
    ///
    /// The join runs on a detached task, so dropping this future early does
    /// not strand the dispatcher in `Draining`. Calling `stop` on a
    /// dispatcher that is not running is a no-op.
    pub async fn stop(&self) {
        let pool = {
            let mut lifecycle = self.lock();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Draining) {
                Lifecycle::Running(pool) => pool,
                other => {
                    *lifecycle = other;
                    return;
                }
            }
        };

        let Pool {
            runtime,
            sender,
            workers,
        } = pool;
        info!(
            outstanding = self.stats().outstanding(),
            "notification dispatcher draining"
        );
        drop(sender);

        let reaper = runtime.spawn(reap_workers(
            workers,
            Arc::clone(&self.lifecycle),
            Arc::clone(&self.context),
        ));
        if let Err(err) = reaper.await {
            error!(error = %err, "notification dispatcher reaper ended abnormally");
        }
    }
}

/// Join every worker, then mark the dispatcher stopped.
async fn reap_workers(
    workers: Vec<JoinHandle<()>>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    context: Arc<WorkerContext>,
) {
    for (worker, handle) in workers.into_iter().enumerate() {
        if let Err(err) = handle.await {
            error!(worker, error = %err, "notification worker ended abnormally");
        }
    }

    *lock_lifecycle(&lifecycle) = Lifecycle::Stopped;
    let stats = context.stats.snapshot();
    info!(
        delivered = stats.delivered,
        failed = stats.failed,
        dropped = stats.dropped,
        "notification dispatcher stopped"
    );
}

impl NotificationQueue for NotificationDispatcher {
    fn submit(&self, job: NotificationJob) -> SubmitOutcome {
        Self::submit(self, job)
    }
}

async fn run_worker(
    worker: usize,
    receiver: Arc<AsyncMutex<mpsc::Receiver<NotificationJob>>>,
    context: Arc<WorkerContext>,
) {
    debug!(worker, "notification worker started");
    loop {
        // Only the worker holding the lock waits on the channel; the others
        // queue on the lock. The guard is released before delivery starts.
        let next = receiver.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        process_job(worker, &job, &context).await;
    }
    debug!(worker, "notification worker exiting");
}

async fn process_job(worker: usize, job: &NotificationJob, context: &WorkerContext) {
    let notification_id = job.notification.id();
    let channel = job.destination.channel;
    let delivery = AssertUnwindSafe(context.delivery.deliver(job))
        .catch_unwind()
        .await;

    match delivery {
        Ok(Ok(())) => {
            context.stats.record_delivered();
            context.record(DispatchOutcome::Delivered);
            info!(worker, %notification_id, %channel, "notification delivered");
        }
        Ok(Err(err)) => {
            context.stats.record_failed();
            context.record(DispatchOutcome::Failed);
            warn!(
                worker,
                %notification_id,
                %channel,
                error = %err,
                "notification delivery failed; job discarded"
            );
        }
        Err(_) => {
            context.stats.record_failed();
            context.record(DispatchOutcome::Failed);
            error!(
                worker,
                %notification_id,
                %channel,
                "notification delivery panicked; job discarded"
            );
        }
    }
}
