//! Pollable handles for long-running operations outside the engine.
//!
//! The engine never cancels or times out an awaitable; it only polls
//! [`Awaitable::is_done`] once per tick until it reports done.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A handle the engine parks on until it reports done.
pub trait Awaitable: Send {
    /// Side-effect free completion poll.
    fn is_done(&self) -> bool;
}

impl<A> Awaitable for Box<A>
where
    A: Awaitable + ?Sized,
{
    fn is_done(&self) -> bool {
        (**self).is_done()
    }
}

impl<A> Awaitable for Arc<A>
where
    A: Awaitable + Sync + ?Sized,
{
    fn is_done(&self) -> bool {
        (**self).is_done()
    }
}

/// Shared completion flag.
///
/// The producing side keeps a clone and calls [`AwaitFlag::set`] when the
/// operation finishes; the consuming task awaits another clone.
#[derive(Debug, Clone, Default)]
pub struct AwaitFlag {
    done: Arc<AtomicBool>,
}

impl AwaitFlag {
    /// Create an unset flag.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the operation finished.
    #[inline]
    pub fn set(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Clear the flag so it can be awaited again.
    #[inline]
    pub fn reset(&self) {
        self.done.store(false, Ordering::Release);
    }
}

impl Awaitable for AwaitFlag {
    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

/// Awaitable backed by a predicate closure.
pub struct PollFn<F> {
    poll: F,
}

impl<F> Awaitable for PollFn<F>
where
    F: Fn() -> bool + Send,
{
    fn is_done(&self) -> bool {
        (self.poll)()
    }
}

/// Build an awaitable from a predicate.
pub fn poll_fn<F>(poll: F) -> PollFn<F>
where
    F: Fn() -> bool + Send,
{
    PollFn { poll }
}
