//! Single-stepped coroutine engine
//!
//! [`CoroutineEngine`] drives one [`Task`] to completion across repeated
//! [`advance`](CoroutineEngine::advance) calls. Nested tasks and awaitables
//! are flattened onto an explicit frame stack so that each external call
//! surfaces at most one value, however deep the nesting goes.
//!
//! # State machine
//!
//! ```text
//! Unconfigured ──attach──▶ Ready ──advance──▶ Running ──(drained)──▶ Done
//!                            ▲                   │
//!                            └────restart────────┘
//! Ready/Running ◀──resume── Suspended ◀──suspend── Ready/Running
//! ```

pub(crate) mod frames;

use thiserror::Error;
use tracing::{debug, trace, warn};

use self::frames::{Frame, FrameStack, Resolution};
use crate::runtime::task::{BoxTask, Task};

/// Engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// No task attached yet.
    #[default]
    Unconfigured,
    /// Task attached, not stepped yet.
    Ready,
    /// At least one advance performed.
    Running,
    /// Paused by [`CoroutineEngine::suspend`].
    Suspended,
    /// Finished, failed or terminated.
    Done,
}

impl std::fmt::Display for EngineState {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let name = match self {
            EngineState::Unconfigured => "unconfigured",
            EngineState::Ready => "ready",
            EngineState::Running => "running",
            EngineState::Suspended => "suspended",
            EngineState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Errors reported through the engine's error callback.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("error raised on engine")]
    Raised,

    #[error("task failed: {0:#}")]
    TaskFailed(anyhow::Error),
}

type TaskFactory<V> = Box<dyn Fn() -> BoxTask<V> + Send>;
type CompleteHook = Box<dyn FnMut() + Send>;
type ErrorHook = Box<dyn FnMut(EngineError) + Send>;

/// Drives a single task to completion, one step per external tick.
pub struct CoroutineEngine<V> {
    state: EngineState,
    /// State to return to on resume.
    resume_to: EngineState,
    factory: Option<TaskFactory<V>>,
    frames: FrameStack<V>,
    current: Option<V>,
    on_complete: Option<CompleteHook>,
    on_error: Option<ErrorHook>,
}

impl<V> std::fmt::Debug for CoroutineEngine<V> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CoroutineEngine")
            .field("state", &self.state)
            .field("depth", &self.frames.depth())
            .field("has_output", &self.current.is_some())
            .finish()
    }
}

impl<V: 'static> CoroutineEngine<V> {
    /// Create an unconfigured engine.
    pub fn new() -> Self {
        Self {
            state: EngineState::Unconfigured,
            resume_to: EngineState::Unconfigured,
            factory: None,
            frames: FrameStack::new(),
            current: None,
            on_complete: None,
            on_error: None,
        }
    }

    /// Bind a task.
    ///
    /// The factory is called now and again on every [`restart`](Self::restart),
    /// so a restarted engine replays the task from the beginning. Any previous
    /// stack and callbacks are discarded.
    pub fn attach<F, T>(
        &mut self,
        factory: F,
    ) -> &mut Self
    where
        F: Fn() -> T + Send + 'static,
        T: Task<V> + 'static,
    {
        let factory: TaskFactory<V> = Box::new(move || Box::new(factory()) as BoxTask<V>);
        self.frames.clear();
        self.frames.push(Frame::Task(factory()));
        self.factory = Some(factory);
        self.current = None;
        self.on_complete = None;
        self.on_error = None;
        self.state = EngineState::Ready;
        debug!("engine attached");
        self
    }

    /// Register the completion callback.
    pub fn on_complete<F>(
        &mut self,
        hook: F,
    ) -> &mut Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_complete = Some(Box::new(hook));
        self
    }

    /// Register the error callback.
    pub fn on_error<F>(
        &mut self,
        hook: F,
    ) -> &mut Self
    where
        F: FnMut(EngineError) + Send + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Perform one step and return this tick's output.
    ///
    /// A no-op while unconfigured, suspended or done.
    pub fn advance(&mut self) -> Option<&V> {
        match self.state {
            EngineState::Unconfigured | EngineState::Suspended | EngineState::Done => {
                return self.current.as_ref();
            }
            EngineState::Ready => {
                self.state = EngineState::Running;
            }
            EngineState::Running => {}
        }

        match self.frames.resolve() {
            Resolution::Suspended(output) => {
                trace!(depth = self.frames.depth(), "engine suspended");
                self.current = output;
            }
            Resolution::Exhausted => self.complete(),
            Resolution::Failed(cause) => {
                warn!("engine task failed: {:#}", cause);
                self.fail(EngineError::TaskFailed(cause));
            }
        }
        self.current.as_ref()
    }

    /// Pause without touching the stack.
    pub fn suspend(&mut self) {
        if matches!(self.state, EngineState::Ready | EngineState::Running) {
            self.resume_to = self.state;
            self.state = EngineState::Suspended;
            trace!("engine suspended by caller");
        }
    }

    /// Undo [`suspend`](Self::suspend). No-op unless suspended.
    pub fn resume(&mut self) {
        if self.state == EngineState::Suspended {
            self.state = self.resume_to;
            trace!("engine resumed");
        }
    }

    /// Replay the attached task from scratch and advance it once.
    pub fn restart(&mut self) -> Option<&V> {
        let Some(factory) = self.factory.as_ref() else {
            return None;
        };
        let root = factory();
        self.frames.clear();
        self.frames.push(Frame::Task(root));
        self.current = None;
        self.state = EngineState::Ready;
        debug!("engine restarted");
        self.advance()
    }

    /// Stop with the error callback.
    ///
    /// Ignored once done; no further callbacks fire afterwards.
    pub fn raise_error(&mut self) {
        if matches!(self.state, EngineState::Unconfigured | EngineState::Done) {
            return;
        }
        debug!("engine error raised");
        self.fail(EngineError::Raised);
    }

    /// Stop silently: the stack is cleared and no callback fires.
    pub fn terminate(&mut self) {
        self.frames.clear();
        self.current = None;
        self.state = EngineState::Done;
        debug!("engine terminated");
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether the engine reached [`EngineState::Done`].
    #[inline]
    pub fn is_done(&self) -> bool {
        self.state == EngineState::Done
    }

    /// Output of the last advance.
    #[inline]
    pub fn current(&self) -> Option<&V> {
        self.current.as_ref()
    }

    /// Take the output of the last advance.
    #[inline]
    pub fn take_current(&mut self) -> Option<V> {
        self.current.take()
    }

    /// Number of pending frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.depth()
    }

    fn complete(&mut self) {
        self.frames.clear();
        self.current = None;
        self.state = EngineState::Done;
        debug!("engine completed");
        if let Some(hook) = self.on_complete.as_mut() {
            hook();
        }
    }

    fn fail(
        &mut self,
        error: EngineError,
    ) {
        self.frames.clear();
        self.current = None;
        self.state = EngineState::Done;
        if let Some(hook) = self.on_error.as_mut() {
            hook(error);
        }
    }
}

impl<V: 'static> Default for CoroutineEngine<V> {
    fn default() -> Self {
        Self::new()
    }
}
