//! Scripted workflow used by the `tickflow demo` command.
//!
//! Exercises every moving part once: an awaited external operation, nested
//! tasks, a task appending follow-up work to its own runner, and optional
//! failure, cancellation and deadline paths.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::runtime::host::{HostLoop, HostReport};
use crate::runtime::runner::{RunnerStats, RunnerStatus, SequentialRunner};
use crate::runtime::task::{action, from_fn, values, AwaitFlag, Step};
use crate::runtime::CoroutineEngine;
use crate::util::config::TickflowConfig;

/// Knobs for [`run_demo`].
#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// Progress values yielded by the processing stage.
    pub steps: u32,
    /// Tick on which the simulated download finishes.
    pub download_ticks: u64,
    /// Make the publish stage fail.
    pub fail: bool,
    /// Cancel the runner on this tick.
    pub cancel_at: Option<u64>,
    /// Overrides the configured runner deadline.
    pub timeout: Option<Duration>,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            steps: 3,
            download_ticks: 2,
            fail: false,
            cancel_at: None,
            timeout: None,
        }
    }
}

/// What happened during [`run_demo`].
#[derive(Debug, Clone)]
pub struct DemoReport {
    pub status: RunnerStatus,
    /// Every value surfaced to the host, in order.
    pub outputs: Vec<String>,
    /// Message passed to the error callback, if any.
    pub error: Option<String>,
    pub finally_ran: bool,
    pub host: HostReport,
    pub stats: RunnerStats,
}

/// Build the demo workflow and drive it through a [`HostLoop`].
pub fn run_demo(
    config: &TickflowConfig,
    options: &DemoOptions,
) -> DemoReport {
    let runner: SequentialRunner<String, String> = SequentialRunner::with_config(&config.runner);
    if let Some(limit) = options.timeout {
        runner.set_timeout_with(limit, move || warn!(?limit, "demo workflow out of time"));
    }

    let error = Arc::new(Mutex::new(None));
    let finally_ran = Arc::new(Mutex::new(false));
    {
        let error = error.clone();
        runner.on_error(move |e| *error.lock() = Some(e.to_string()));
        let finally_ran = finally_ran.clone();
        runner.on_finally(move || *finally_ran.lock() = true);
        runner.on_complete(|| info!("demo workflow completed"));
    }

    let download = AwaitFlag::new();

    // fetch: park on the external download
    let flag = download.clone();
    let mut fetch_stage = 0;
    runner.append(from_fn(move || {
        fetch_stage += 1;
        match fetch_stage {
            1 => Step::Yield("download started".to_string()),
            2 => Step::wait(flag.clone()),
            3 => Step::Yield("download finished".to_string()),
            _ => Step::Complete,
        }
    }));

    // process: progress values, each followed by a nested checksum
    let steps = options.steps;
    let mut current = 0;
    let mut checked = true;
    runner.append(from_fn(move || {
        if !checked {
            checked = true;
            return Step::nest(values(vec![format!("checksum {}", current)]));
        }
        if current == steps {
            return Step::Complete;
        }
        current += 1;
        checked = false;
        Step::Yield(format!("progress {}/{}", current, steps))
    }));

    // publish: queue a follow-up notification on the same runner
    let handle = runner.clone();
    let fail = options.fail;
    runner.append(from_fn(move || {
        if fail {
            return Step::fail("publish rejected by remote");
        }
        handle.append(action(|| info!("subscribers notified")));
        Step::Complete
    }));

    let mut engine = CoroutineEngine::new();
    let drive = runner.clone();
    engine.attach(move || drive.coroutine());

    let outputs = Arc::new(Mutex::new(Vec::new()));
    let host = {
        let outputs = outputs.clone();
        let runner = runner.clone();
        let download_ticks = options.download_ticks;
        let cancel_at = options.cancel_at;
        HostLoop::new(&config.host).drive(&mut engine, move |tick, output| {
            if let Some(value) = output {
                info!(tick, "{}", value);
                outputs.lock().push(value.clone());
            }
            if tick >= download_ticks {
                download.set();
            }
            if cancel_at == Some(tick) {
                runner.cancel();
            }
        })
    };

    let outputs = outputs.lock().clone();
    let error = error.lock().clone();
    let finally_ran = *finally_ran.lock();
    DemoReport {
        status: runner.status(),
        outputs,
        error,
        finally_ran,
        host,
        stats: runner.stats(),
    }
}
