//! Sequential task runner
//!
//! [`SequentialRunner`] owns a FIFO queue of tasks and drives them one at a
//! time, one tick per call to [`tick`](SequentialRunner::tick). It layers
//! cancellation, typed error escalation, a deadline and a polled interruption
//! hook on top of the same frame-stack stepping the coroutine engine uses.
//!
//! # Tick order
//!
//! ```text
//! deadline ─▶ interruption ─▶ ┌─ deadline / cancel / error / empty? ─▶ stop
//!                             └─ step head ─┬─ suspended ─▶ yield to host
//!                                           ├─ drained   ─▶ dequeue, loop
//!                                           └─ failed    ─▶ stop (Exception)
//! ```
//!
//! A panic inside a step is caught and treated as a failed task.
//!
//! The runner is a cheap handle; clones share one queue. Tasks may capture a
//! clone and call [`append`](SequentialRunner::append),
//! [`cancel`](SequentialRunner::cancel) or
//! [`raise_error`](SequentialRunner::raise_error) from inside their own step.

pub mod clock;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RunnerError, RunnerStatus};

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::runtime::coroutine::frames::{FrameStack, Resolution};
use crate::runtime::task::{BoxTask, Step, Task, TaskId, TaskIdGenerator};
use crate::util::config::RunnerConfig;

type Hook = Box<dyn FnOnce() + Send>;
type ErrorHook<E> = Box<dyn FnOnce(RunnerError<E>) + Send>;

/// Result of one [`SequentialRunner::tick`].
#[derive(Debug, PartialEq, Eq)]
pub enum Tick<V> {
    /// The head task suspended; the value (if any) is this tick's output.
    Suspended(Option<V>),
    /// The runner has stopped.
    Finished(RunnerStatus),
}

/// Runner counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerStats {
    /// Ticks performed while running.
    pub ticks: u64,
    /// Tasks that drained and were dequeued.
    pub tasks_completed: u64,
    /// Ticks that ended in a suspension.
    pub suspensions: u64,
    /// Ticks on which the interruption predicate held.
    pub interrupts: u64,
}

struct Deadline {
    limit: Duration,
    on_timeout: Option<Hook>,
}

struct Interruption {
    predicate: Box<dyn FnMut() -> bool + Send>,
    action: Box<dyn FnMut() + Send>,
}

struct Entry<V> {
    id: TaskId,
    /// Taken while the entry is being stepped.
    frames: Option<FrameStack<V>>,
}

struct Inner<V, E> {
    status: RunnerStatus,
    queue: VecDeque<Entry<V>>,
    ids: TaskIdGenerator,
    cancel_requested: bool,
    outcome: Option<RunnerError<E>>,
    deadline: Option<Deadline>,
    started_at: Option<Instant>,
    interruption: Option<Interruption>,
    /// Bumped whenever the interruption hook is installed or removed.
    interruption_epoch: u64,
    on_complete: Option<Hook>,
    on_error: Option<ErrorHook<E>>,
    on_finally: Option<Hook>,
    clock: Box<dyn Clock>,
    stats: RunnerStats,
}

impl<V, E> Inner<V, E> {
    /// Record a timeout if the deadline passed. Returns `true` when it did.
    fn check_deadline(&mut self) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        let (Some(deadline), Some(started_at)) = (self.deadline.as_ref(), self.started_at) else {
            return false;
        };
        let elapsed = self.clock.now().saturating_duration_since(started_at);
        if elapsed < deadline.limit {
            return false;
        }
        warn!(?elapsed, limit = ?deadline.limit, "runner deadline exceeded");
        self.outcome = Some(RunnerError::Timeout(deadline.limit));
        true
    }

    fn should_stop(&mut self) -> bool {
        self.check_deadline();
        self.outcome.is_some() || self.cancel_requested || self.queue.is_empty()
    }
}

/// Everything handed out of the lock when the runner stops.
struct Stopped<V, E> {
    status: RunnerStatus,
    outcome: Option<RunnerError<E>>,
    on_complete: Option<Hook>,
    on_error: Option<ErrorHook<E>>,
    on_finally: Option<Hook>,
    on_timeout: Option<Hook>,
    leftover: VecDeque<Entry<V>>,
    interruption: Option<Interruption>,
}

/// Drives a queue of tasks one at a time.
pub struct SequentialRunner<V, E> {
    inner: Arc<Mutex<Inner<V, E>>>,
}

impl<V, E> Clone for SequentialRunner<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V, E> std::fmt::Debug for SequentialRunner<V, E> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SequentialRunner")
            .field("status", &inner.status)
            .field("queued", &inner.queue.len())
            .field("cancel_requested", &inner.cancel_requested)
            .field("stats", &inner.stats)
            .finish()
    }
}

impl<V, E> SequentialRunner<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    /// Create an idle runner on the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create an idle runner on a custom clock.
    pub fn with_clock<C>(clock: C) -> Self
    where
        C: Clock + 'static,
    {
        let inner = Inner {
            status: RunnerStatus::Idle,
            queue: VecDeque::new(),
            ids: TaskIdGenerator::new(),
            cancel_requested: false,
            outcome: None,
            deadline: None,
            started_at: None,
            interruption: None,
            interruption_epoch: 0,
            on_complete: None,
            on_error: None,
            on_finally: None,
            clock: Box::new(clock),
            stats: RunnerStats::default(),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Create a runner with the configured deadline armed.
    pub fn with_config(config: &RunnerConfig) -> Self {
        let runner = Self::new();
        if let Some(limit) = config.timeout() {
            runner.set_timeout(limit);
        }
        runner
    }

    /// Enqueue a task at the tail.
    ///
    /// Legal at any time, including from inside a running task. Once the
    /// runner has stopped the task is accepted and dropped.
    pub fn append<T>(
        &self,
        task: T,
    ) -> TaskId
    where
        T: Task<V> + 'static,
    {
        self.append_boxed(Box::new(task))
    }

    /// Enqueue an already boxed task.
    pub fn append_boxed(
        &self,
        task: BoxTask<V>,
    ) -> TaskId {
        let mut inner = self.inner.lock();
        let id = inner.ids.next();
        if inner.status.is_terminal() {
            drop(inner);
            debug!(%id, "runner already stopped, task dropped");
            return id;
        }
        inner.queue.push_back(Entry {
            id,
            frames: Some(FrameStack::with_root(task)),
        });
        trace!(%id, queued = inner.queue.len(), "task appended");
        id
    }

    /// Enqueue several tasks in order.
    pub fn append_all<I, T>(
        &self,
        tasks: I,
    ) -> Vec<TaskId>
    where
        I: IntoIterator<Item = T>,
        T: Task<V> + 'static,
    {
        tasks.into_iter().map(|task| self.append(task)).collect()
    }

    /// Arm a deadline measured from the first tick. Replaces any previous one.
    pub fn set_timeout(
        &self,
        limit: Duration,
    ) -> &Self {
        let previous = self.inner.lock().deadline.replace(Deadline {
            limit,
            on_timeout: None,
        });
        drop(previous);
        self
    }

    /// Arm a deadline with a callback fired when it passes.
    pub fn set_timeout_with<F>(
        &self,
        limit: Duration,
        on_timeout: F,
    ) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        let previous = self.inner.lock().deadline.replace(Deadline {
            limit,
            on_timeout: Some(Box::new(on_timeout)),
        });
        drop(previous);
        self
    }

    /// Disarm the deadline.
    pub fn disable_timeout(&self) -> &Self {
        let previous = self.inner.lock().deadline.take();
        drop(previous);
        self
    }

    /// Install a condition polled once at the start of every tick.
    ///
    /// When it holds, `action` runs. Neither stops the run by itself; the
    /// action has to call [`cancel`](Self::cancel) or
    /// [`raise_error`](Self::raise_error) for that.
    pub fn set_interruption<P, A>(
        &self,
        predicate: P,
        action: A,
    ) -> &Self
    where
        P: FnMut() -> bool + Send + 'static,
        A: FnMut() + Send + 'static,
    {
        let previous = {
            let mut inner = self.inner.lock();
            inner.interruption_epoch += 1;
            inner.interruption.replace(Interruption {
                predicate: Box::new(predicate),
                action: Box::new(action),
            })
        };
        drop(previous);
        self
    }

    /// Remove the interruption hook. Takes effect even from inside its own action.
    pub fn clear_interruption(&self) -> &Self {
        let previous = {
            let mut inner = self.inner.lock();
            inner.interruption_epoch += 1;
            inner.interruption.take()
        };
        drop(previous);
        self
    }

    /// Runs when the queue drains without an error or a cancel.
    pub fn on_complete<F>(
        &self,
        hook: F,
    ) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        let previous = self.inner.lock().on_complete.replace(Box::new(hook));
        drop(previous);
        self
    }

    /// Receives the classified outcome of a raised error, failed task or timeout.
    pub fn on_error<F>(
        &self,
        hook: F,
    ) -> &Self
    where
        F: FnOnce(RunnerError<E>) + Send + 'static,
    {
        let previous = self.inner.lock().on_error.replace(Box::new(hook));
        drop(previous);
        self
    }

    /// Runs last on every path, cancellation included.
    pub fn on_finally<F>(
        &self,
        hook: F,
    ) -> &Self
    where
        F: FnOnce() + Send + 'static,
    {
        let previous = self.inner.lock().on_finally.replace(Box::new(hook));
        drop(previous);
        self
    }

    /// Request silent termination at the next check.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        if !inner.status.is_terminal() && !inner.cancel_requested {
            inner.cancel_requested = true;
            debug!("runner cancel requested");
        }
    }

    /// Record an application error and request termination.
    ///
    /// The first recorded outcome of a run wins.
    pub fn raise_error(
        &self,
        payload: E,
    ) {
        let mut inner = self.inner.lock();
        if inner.status.is_terminal() || inner.outcome.is_some() {
            drop(inner);
            debug!("runner outcome already decided, raised error ignored");
            return;
        }
        debug!("runner error raised");
        inner.outcome = Some(RunnerError::Raised(payload));
    }

    /// Drive the runner by one external tick.
    pub fn tick(&self) -> Tick<V> {
        {
            let mut inner = self.inner.lock();
            if inner.status.is_terminal() {
                return Tick::Finished(inner.status);
            }
            if inner.status == RunnerStatus::Idle {
                inner.status = RunnerStatus::Running;
                inner.started_at = Some(inner.clock.now());
                debug!(queued = inner.queue.len(), "runner started");
            }
            inner.stats.ticks += 1;
            if inner.check_deadline() {
                drop(inner);
                return self.finish();
            }
        }

        self.poll_interruption();

        loop {
            let (id, mut frames) = {
                let mut inner = self.inner.lock();
                if inner.should_stop() {
                    drop(inner);
                    return self.finish();
                }
                let Some(head) = inner.queue.front_mut() else {
                    drop(inner);
                    return self.finish();
                };
                let id = head.id;
                match head.frames.take() {
                    Some(frames) => (id, frames),
                    None => {
                        drop(inner);
                        warn!(%id, "runner ticked from inside its own task");
                        return Tick::Suspended(None);
                    }
                }
            };

            let resolution = match panic::catch_unwind(AssertUnwindSafe(|| frames.resolve())) {
                Ok(resolution) => resolution,
                Err(payload) => Resolution::Failed(anyhow!("task panicked: {}", panic_message(&*payload))),
            };

            let mut inner = self.inner.lock();
            // the step ticked this runner to a stop already
            if inner.status.is_terminal() {
                let status = inner.status;
                drop(inner);
                drop(resolution);
                drop(frames);
                return Tick::Finished(status);
            }
            match resolution {
                Resolution::Suspended(output) => {
                    if let Some(head) = inner.queue.front_mut() {
                        head.frames = Some(frames);
                    }
                    inner.stats.suspensions += 1;
                    return Tick::Suspended(output);
                }
                Resolution::Exhausted => {
                    let done = inner.queue.pop_front();
                    inner.stats.tasks_completed += 1;
                    drop(inner);
                    drop(done);
                    trace!(%id, "task completed");
                }
                Resolution::Failed(cause) => {
                    let failed = inner.queue.pop_front();
                    warn!(%id, "task failed: {:#}", cause);
                    if inner.outcome.is_none() {
                        inner.outcome = Some(RunnerError::Exception(cause));
                    }
                    drop(inner);
                    drop(failed);
                    drop(frames);
                    return self.finish();
                }
            }
        }
    }

    /// Wrap the drive loop as a task so the runner can nest in an engine.
    pub fn coroutine(&self) -> RunnerTask<V, E> {
        RunnerTask {
            runner: self.clone(),
        }
    }

    /// Current lifecycle status.
    pub fn status(&self) -> RunnerStatus {
        self.inner.lock().status
    }

    /// Whether the runner has stopped.
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Number of queued tasks, the running head included.
    pub fn pending(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Whether [`cancel`](Self::cancel) was called during this run.
    pub fn is_cancel_requested(&self) -> bool {
        self.inner.lock().cancel_requested
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> RunnerStats {
        self.inner.lock().stats
    }

    /// Time since the first tick.
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.inner.lock();
        inner
            .started_at
            .map(|started_at| inner.clock.now().saturating_duration_since(started_at))
    }

    fn poll_interruption(&self) {
        let (mut interruption, epoch) = {
            let mut inner = self.inner.lock();
            let Some(interruption) = inner.interruption.take() else {
                return;
            };
            (interruption, inner.interruption_epoch)
        };

        if (interruption.predicate)() {
            self.inner.lock().stats.interrupts += 1;
            debug!("runner interruption triggered");
            (interruption.action)();
        }

        // the action may have replaced or cleared the hook
        let stale = {
            let mut inner = self.inner.lock();
            if inner.interruption_epoch == epoch && !inner.status.is_terminal() {
                inner.interruption = Some(interruption);
                None
            } else {
                Some(interruption)
            }
        };
        drop(stale);
    }

    /// Move to a terminal status and fire the callbacks outside the lock.
    fn finish(&self) -> Tick<V> {
        let stopped = {
            let mut inner = self.inner.lock();
            let outcome = inner.outcome.take();
            let status = match &outcome {
                None if inner.cancel_requested => RunnerStatus::Cancelled,
                None => RunnerStatus::Completed,
                Some(RunnerError::Timeout(_)) => RunnerStatus::TimedOut,
                Some(_) => RunnerStatus::Errored,
            };
            inner.status = status;
            let on_timeout = if status == RunnerStatus::TimedOut {
                inner.deadline.take().and_then(|deadline| deadline.on_timeout)
            } else {
                None
            };
            Stopped {
                status,
                outcome,
                on_complete: inner.on_complete.take(),
                on_error: inner.on_error.take(),
                on_finally: inner.on_finally.take(),
                on_timeout,
                leftover: std::mem::take(&mut inner.queue),
                interruption: inner.interruption.take(),
            }
        };

        debug!(
            status = %stopped.status,
            dropped = stopped.leftover.len(),
            "runner stopped"
        );

        let Stopped {
            status,
            outcome,
            on_complete,
            on_error,
            on_finally,
            on_timeout,
            leftover,
            interruption,
        } = stopped;
        drop(leftover);
        drop(interruption);

        match outcome {
            None => {
                if status == RunnerStatus::Completed {
                    if let Some(hook) = on_complete {
                        hook();
                    }
                }
            }
            Some(error) => {
                if let Some(hook) = on_timeout {
                    hook();
                }
                if let Some(hook) = on_error {
                    hook(error);
                }
            }
        }
        if let Some(hook) = on_finally {
            hook();
        }

        Tick::Finished(status)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

impl<V, E> Default for SequentialRunner<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The runner's drive loop as a [`Task`].
///
/// Each step is one [`SequentialRunner::tick`]; the task completes when the
/// runner stops, whatever the outcome. Failures are reported through the
/// runner's callbacks, never to the enclosing engine.
pub struct RunnerTask<V, E> {
    runner: SequentialRunner<V, E>,
}

impl<V, E> Task<V> for RunnerTask<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    fn step(&mut self) -> Step<V> {
        match self.runner.tick() {
            Tick::Suspended(Some(value)) => Step::Yield(value),
            Tick::Suspended(None) => Step::Pending,
            Tick::Finished(_) => Step::Complete,
        }
    }
}
