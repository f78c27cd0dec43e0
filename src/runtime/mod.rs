//! Runtime system
//!
//! This module contains the task model, the coroutine engine, the sequential
//! runner built on top of it, and a reference host tick loop.

pub mod coroutine;
pub mod host;
pub mod runner;
pub mod task;

pub use coroutine::{CoroutineEngine, EngineError, EngineState};
pub use host::{HostLoop, HostReport};
pub use runner::{RunnerError, RunnerStats, RunnerStatus, RunnerTask, SequentialRunner, Tick};
pub use task::{AwaitFlag, Awaitable, BoxTask, Step, Task, TaskId};
