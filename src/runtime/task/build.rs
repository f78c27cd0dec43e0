//! Builders for common task shapes.
//!
//! Hand-written [`Task`] impls are fine for anything stateful; these cover
//! the shapes that come up in almost every workflow.

use super::{Awaitable, Step, Task};

/// Task driven by a closure, called once per step.
///
/// ```rust
/// use tickflow::runtime::task::{from_fn, Step, Task};
///
/// let mut left = 2;
/// let mut countdown = from_fn(move || {
///     if left == 0 {
///         return Step::Complete;
///     }
///     left -= 1;
///     Step::Yield(left)
/// });
/// assert!(matches!(countdown.step(), Step::Yield(1)));
/// assert!(matches!(countdown.step(), Step::Yield(0)));
/// assert!(countdown.step().is_complete());
/// ```
pub fn from_fn<V, F>(f: F) -> FromFn<F>
where
    F: FnMut() -> Step<V> + Send,
{
    FromFn { f }
}

/// See [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

impl<V, F> Task<V> for FromFn<F>
where
    F: FnMut() -> Step<V> + Send,
{
    fn step(&mut self) -> Step<V> {
        (self.f)()
    }
}

/// Task replaying a fixed sequence of steps, completing when exhausted.
pub fn from_steps<V, I>(steps: I) -> FromSteps<I::IntoIter>
where
    I: IntoIterator<Item = Step<V>>,
    I::IntoIter: Send,
{
    FromSteps {
        steps: steps.into_iter(),
    }
}

/// See [`from_steps`].
pub struct FromSteps<I> {
    steps: I,
}

impl<V, I> Task<V> for FromSteps<I>
where
    I: Iterator<Item = Step<V>> + Send,
{
    fn step(&mut self) -> Step<V> {
        self.steps.next().unwrap_or(Step::Complete)
    }
}

/// Task that runs a closure on its first step and completes without yielding.
pub fn action<F>(f: F) -> Action<F>
where
    F: FnOnce() + Send,
{
    Action { f: Some(f) }
}

/// See [`action`].
pub struct Action<F> {
    f: Option<F>,
}

impl<V, F> Task<V> for Action<F>
where
    F: FnOnce() + Send,
{
    fn step(&mut self) -> Step<V> {
        if let Some(f) = self.f.take() {
            f();
        }
        Step::Complete
    }
}

/// Task yielding each value in turn.
pub fn values<V, I>(values: I) -> Values<I::IntoIter>
where
    I: IntoIterator<Item = V>,
    I::IntoIter: Send,
{
    Values {
        values: values.into_iter(),
    }
}

/// See [`values`].
pub struct Values<I> {
    values: I,
}

impl<V, I> Task<V> for Values<I>
where
    I: Iterator<Item = V> + Send,
{
    fn step(&mut self) -> Step<V> {
        match self.values.next() {
            Some(v) => Step::Yield(v),
            None => Step::Complete,
        }
    }
}

/// Task suspending `ticks` times without a value.
pub fn wait_ticks(ticks: usize) -> WaitTicks {
    WaitTicks { left: ticks }
}

/// See [`wait_ticks`].
#[derive(Debug, Clone)]
pub struct WaitTicks {
    left: usize,
}

impl<V> Task<V> for WaitTicks {
    fn step(&mut self) -> Step<V> {
        if self.left == 0 {
            return Step::Complete;
        }
        self.left -= 1;
        Step::Pending
    }
}

/// Task parking on a single awaitable.
pub fn wait_for<A>(awaitable: A) -> WaitFor<A>
where
    A: Awaitable + 'static,
{
    WaitFor {
        awaitable: Some(awaitable),
    }
}

/// See [`wait_for`].
pub struct WaitFor<A> {
    awaitable: Option<A>,
}

impl<V, A> Task<V> for WaitFor<A>
where
    A: Awaitable + 'static,
{
    fn step(&mut self) -> Step<V> {
        match self.awaitable.take() {
            Some(a) => Step::wait(a),
            None => Step::Complete,
        }
    }
}
