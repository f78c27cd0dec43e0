//! Reference host tick loop
//!
//! Calls [`CoroutineEngine::advance`] once per tick, sleeping the configured
//! interval between ticks, the way a frame loop would. A runner is driven by
//! attaching its [`coroutine`](crate::runtime::runner::SequentialRunner::coroutine).

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::runtime::coroutine::{CoroutineEngine, EngineState};
use crate::util::config::HostConfig;

/// Summary of one [`HostLoop::drive`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostReport {
    /// Ticks performed.
    pub ticks: u64,
    /// Whether the engine reached `Done`.
    pub finished: bool,
    /// Wall time spent driving.
    pub elapsed: Duration,
}

/// Fixed-rate tick driver.
#[derive(Debug, Clone)]
pub struct HostLoop {
    tick_interval: Duration,
    max_ticks: Option<u64>,
}

impl HostLoop {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            max_ticks: config.max_ticks,
        }
    }

    /// Tick as fast as possible, with no tick limit.
    pub fn unpaced() -> Self {
        Self {
            tick_interval: Duration::ZERO,
            max_ticks: None,
        }
    }

    pub fn with_max_ticks(
        mut self,
        max_ticks: u64,
    ) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    /// Drive the engine until it is done or the tick limit is hit.
    ///
    /// `on_tick` sees every tick's number (from 1) and output. An engine left
    /// suspended keeps consuming ticks, so set a limit when that can happen.
    pub fn drive<V, F>(
        &self,
        engine: &mut CoroutineEngine<V>,
        mut on_tick: F,
    ) -> HostReport
    where
        V: 'static,
        F: FnMut(u64, Option<&V>),
    {
        let started = Instant::now();
        let mut ticks = 0;

        if engine.state() != EngineState::Unconfigured {
            debug!(interval = ?self.tick_interval, max_ticks = ?self.max_ticks, "host loop started");
            while !engine.is_done() {
                if self.max_ticks.is_some_and(|max| ticks >= max) {
                    debug!(ticks, "host loop tick limit reached");
                    break;
                }
                ticks += 1;
                let output = engine.advance();
                trace!(ticks, has_output = output.is_some(), "host tick");
                on_tick(ticks, output);
                if engine.is_done() {
                    break;
                }
                if !self.tick_interval.is_zero() {
                    thread::sleep(self.tick_interval);
                }
            }
        }

        HostReport {
            ticks,
            finished: engine.is_done(),
            elapsed: started.elapsed(),
        }
    }
}

impl Default for HostLoop {
    fn default() -> Self {
        Self::new(&HostConfig::default())
    }
}
