//! Runner outcome types.

use std::time::Duration;

use thiserror::Error;

/// Classified outcome of a failed runner execution.
///
/// Exactly one is produced per run and handed to the error callback.
#[derive(Debug, Error)]
pub enum RunnerError<E> {
    /// Application-level failure passed to [`raise_error`](super::SequentialRunner::raise_error).
    #[error("error raised: {0:?}")]
    Raised(E),

    /// A queued task failed while being stepped.
    #[error("task failed: {0:#}")]
    Exception(anyhow::Error),

    /// The deadline passed before the queue drained.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl<E> RunnerError<E> {
    /// Payload of a raised error.
    pub fn raised(&self) -> Option<&E> {
        match self {
            RunnerError::Raised(payload) => Some(payload),
            _ => None,
        }
    }

    /// Consume into the raised payload.
    pub fn into_raised(self) -> Option<E> {
        match self {
            RunnerError::Raised(payload) => Some(payload),
            _ => None,
        }
    }

    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunnerError::Timeout(_))
    }

    #[inline]
    pub fn is_exception(&self) -> bool {
        matches!(self, RunnerError::Exception(_))
    }
}

/// Runner lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerStatus {
    /// Not ticked yet.
    #[default]
    Idle,
    /// Ticked at least once, not stopped.
    Running,
    /// Queue drained.
    Completed,
    /// Stopped by [`cancel`](super::SequentialRunner::cancel).
    Cancelled,
    /// Stopped by a raised error or a failing task.
    Errored,
    /// Stopped by the deadline.
    TimedOut,
}

impl RunnerStatus {
    /// Whether the runner has stopped for good.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunnerStatus::Idle | RunnerStatus::Running)
    }
}

impl std::fmt::Display for RunnerStatus {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let name = match self {
            RunnerStatus::Idle => "idle",
            RunnerStatus::Running => "running",
            RunnerStatus::Completed => "completed",
            RunnerStatus::Cancelled => "cancelled",
            RunnerStatus::Errored => "errored",
            RunnerStatus::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}
