//! Task definitions for the cooperative engine.
//!
//! A [`Task`] is a lazy, resumable computation. Each call to [`Task::step`]
//! advances it by one suspension point and reports what happened through a
//! [`Step`]: a value to surface, a nested task to run first, an external
//! [`Awaitable`] to park on, completion, or failure.

pub mod awaitable;
pub mod build;

pub use awaitable::{poll_fn, AwaitFlag, Awaitable, PollFn};
pub use build::{action, from_fn, from_steps, values, wait_for, wait_ticks};

/// Boxed task, the unit owned by engines and runner queues.
pub type BoxTask<V> = Box<dyn Task<V>>;

/// A lazy, resumable, possibly infinite computation.
pub trait Task<V>: Send {
    /// Advance to the next suspension point.
    fn step(&mut self) -> Step<V>;
}

impl<V, T> Task<V> for Box<T>
where
    T: Task<V> + ?Sized,
{
    fn step(&mut self) -> Step<V> {
        (**self).step()
    }
}

/// Outcome of a single [`Task::step`] call.
pub enum Step<V> {
    /// Suspend, surfacing a literal value to the driver.
    Yield(V),
    /// Suspend without a value.
    Pending,
    /// Run the given task to completion before stepping this one again.
    Nest(BoxTask<V>),
    /// Park until the handle reports done.
    Await(Box<dyn Awaitable>),
    /// Finished with no further values.
    Complete,
    /// Failed while stepping.
    Fail(anyhow::Error),
}

impl<V> Step<V> {
    /// Nest a task.
    #[inline]
    pub fn nest<T>(task: T) -> Self
    where
        T: Task<V> + 'static,
    {
        Step::Nest(Box::new(task))
    }

    /// Park on an awaitable.
    #[inline]
    pub fn wait<A>(awaitable: A) -> Self
    where
        A: Awaitable + 'static,
    {
        Step::Await(Box::new(awaitable))
    }

    /// Fail with a message.
    #[inline]
    pub fn fail(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Step::Fail(anyhow::Error::msg(message))
    }

    /// Returns `true` for [`Step::Complete`].
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, Step::Complete)
    }

    /// Returns `true` for [`Step::Fail`].
    #[inline]
    pub fn is_fail(&self) -> bool {
        matches!(self, Step::Fail(_))
    }

    /// Transform a yielded value, leaving other variants untouched.
    pub fn map_yielded<F>(
        self,
        f: F,
    ) -> Self
    where
        F: FnOnce(V) -> V,
    {
        match self {
            Step::Yield(v) => Step::Yield(f(v)),
            other => other,
        }
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for Step<V> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Step::Yield(v) => f.debug_tuple("Yield").field(v).finish(),
            Step::Pending => write!(f, "Pending"),
            Step::Nest(_) => write!(f, "Nest(..)"),
            Step::Await(_) => write!(f, "Await(..)"),
            Step::Complete => write!(f, "Complete"),
            Step::Fail(e) => f.debug_tuple("Fail").field(e).finish(),
        }
    }
}

/// Unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

impl TaskId {
    /// Get the inner value.
    #[inline]
    pub fn inner(&self) -> usize {
        self.0
    }
}

impl From<usize> for TaskId {
    fn from(val: usize) -> Self {
        Self(val)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Sequential task id source.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    next_id: usize,
}

impl TaskIdGenerator {
    /// Create a new task ID generator.
    #[inline]
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Generate the next task ID.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        TaskId(id)
    }
}

#[cfg(test)]
mod tests;
