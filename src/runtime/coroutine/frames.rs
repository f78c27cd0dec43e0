//! Frame stack used to flatten nested tasks into one step sequence.
//!
//! The stack holds the depth-first expansion of the running task: the root
//! at the bottom, the innermost nested task or pending value on top. Frames
//! are only popped once exhausted or resolved.

use smallvec::SmallVec;

use crate::runtime::task::{Awaitable, BoxTask, Step};

/// A pending thing to resolve.
pub(crate) enum Frame<V> {
    /// Literal suspension value, surfaced as-is.
    Value(V),
    /// Task to step until it completes.
    Task(BoxTask<V>),
    /// External handle to poll.
    Await(Box<dyn Awaitable>),
    /// Suspend once with no value.
    Empty,
}

/// What one resolution pass produced.
pub(crate) enum Resolution<V> {
    /// A suspension point was reached; the value (if any) is this tick's output.
    Suspended(Option<V>),
    /// The stack drained without another suspension.
    Exhausted,
    /// A task failed while stepping. The stack is left as it was below the failing frame.
    Failed(anyhow::Error),
}

pub(crate) struct FrameStack<V> {
    frames: SmallVec<[Frame<V>; 4]>,
}

impl<V> FrameStack<V> {
    pub(crate) fn new() -> Self {
        Self {
            frames: SmallVec::new(),
        }
    }

    pub(crate) fn with_root(root: BoxTask<V>) -> Self {
        let mut stack = Self::new();
        stack.frames.push(Frame::Task(root));
        stack
    }

    #[inline]
    pub(crate) fn push(
        &mut self,
        frame: Frame<V>,
    ) {
        self.frames.push(frame);
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.frames.clear();
    }

    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Resolve frames until a suspension point, exhaustion, or failure.
    ///
    /// Nested expansion, finished awaitables and completed tasks collapse into
    /// the same call; only a literal value, an empty frame, or an unfinished
    /// awaitable stop the pass.
    pub(crate) fn resolve(&mut self) -> Resolution<V> {
        loop {
            let Some(frame) = self.frames.pop() else {
                return Resolution::Exhausted;
            };

            match frame {
                Frame::Empty => return Resolution::Suspended(None),
                Frame::Value(value) => return Resolution::Suspended(Some(value)),
                Frame::Await(awaitable) => {
                    if !awaitable.is_done() {
                        self.frames.push(Frame::Await(awaitable));
                        return Resolution::Suspended(None);
                    }
                }
                Frame::Task(mut task) => {
                    let next = match task.step() {
                        Step::Yield(value) => Frame::Value(value),
                        Step::Pending => Frame::Empty,
                        Step::Nest(nested) => Frame::Task(nested),
                        Step::Await(awaitable) => Frame::Await(awaitable),
                        Step::Complete => continue,
                        Step::Fail(cause) => return Resolution::Failed(cause),
                    };
                    self.frames.push(Frame::Task(task));
                    self.frames.push(next);
                }
            }
        }
    }
}

impl<V> Default for FrameStack<V> {
    fn default() -> Self {
        Self::new()
    }
}
