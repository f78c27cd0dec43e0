//! Tickflow - cooperative task execution driven by a host tick loop
//!
//! A [`Task`] is a lazy, resumable computation. The [`CoroutineEngine`]
//! single-steps one task, flattening nested tasks and awaited external
//! handles onto an explicit frame stack so that every external tick surfaces
//! at most one value. The [`SequentialRunner`] drives a growing FIFO queue of
//! tasks on the same stepping model and adds cancellation, typed errors, a
//! deadline and an interruption hook.
//!
//! Nothing here spawns threads: the host calls in once per tick (a frame, a
//! timer, an event-loop turn) and everything between two suspension points
//! runs synchronously inside that call.
//!
//! # Example
//!
//! ```rust
//! use tickflow::runtime::task::{action, values};
//! use tickflow::{CoroutineEngine, SequentialRunner, Tick};
//!
//! let runner: SequentialRunner<&'static str, String> = SequentialRunner::new();
//! runner.append(values(vec!["loading", "loaded"]));
//! runner.append(action(|| println!("ready")));
//!
//! assert_eq!(runner.tick(), Tick::Suspended(Some("loading")));
//! assert_eq!(runner.tick(), Tick::Suspended(Some("loaded")));
//! assert!(matches!(runner.tick(), Tick::Finished(_)));
//!
//! // A single task can be driven directly by an engine.
//! let mut engine = CoroutineEngine::new();
//! engine.attach(|| values(vec![1, 2]));
//! assert_eq!(engine.advance(), Some(&1));
//! ```

#![doc(html_root_url = "https://docs.rs/tickflow")]
#![warn(rust_2018_idioms)]

pub mod demo;
pub mod runtime;
pub mod util;

// Re-exports
pub use runtime::coroutine::{CoroutineEngine, EngineError, EngineState};
pub use runtime::host::{HostLoop, HostReport};
pub use runtime::runner::{RunnerError, RunnerStatus, SequentialRunner, Tick};
pub use runtime::task::{Awaitable, Step, Task};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "Tickflow";
