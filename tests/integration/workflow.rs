//! End-to-end workflows through the public API

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tickflow::runtime::runner::ManualClock;
use tickflow::runtime::task::{action, from_fn, values, wait_for, AwaitFlag};
use tickflow::{CoroutineEngine, HostLoop, RunnerStatus, SequentialRunner, Step, Task, Tick};

/// Task that appends `remaining` copies of itself to the runner it runs on.
struct Chain {
    runner: SequentialRunner<u32, String>,
    remaining: u32,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Task<u32> for Chain {
    fn step(&mut self) -> Step<u32> {
        self.log.lock().push(self.remaining);
        if self.remaining > 0 {
            self.runner.append(Chain {
                runner: self.runner.clone(),
                remaining: self.remaining - 1,
                log: self.log.clone(),
            });
        }
        Step::Complete
    }
}

#[test]
fn test_chained_workflow_drains_in_one_tick() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let runner: SequentialRunner<u32, String> = SequentialRunner::new();
    runner.append(Chain {
        runner: runner.clone(),
        remaining: 4,
        log: log.clone(),
    });

    assert_eq!(runner.tick(), Tick::Finished(RunnerStatus::Completed));
    assert_eq!(*log.lock(), vec![4, 3, 2, 1, 0]);
    assert_eq!(runner.stats().tasks_completed, 5);
}

#[test]
fn test_runner_inside_engine_inside_host_loop() {
    let flag = AwaitFlag::new();
    let runner: SequentialRunner<u32, String> = SequentialRunner::new();
    runner.append(values(vec![1, 2]));
    runner.append(wait_for(flag.clone()));
    runner.append(values(vec![3]));

    let finally = Arc::new(AtomicUsize::new(0));
    let f = finally.clone();
    runner.on_finally(move || {
        f.fetch_add(1, Ordering::SeqCst);
    });

    let handle = runner.clone();
    let mut engine = CoroutineEngine::new();
    engine.attach(move || handle.coroutine());

    let mut seen = Vec::new();
    let report = HostLoop::unpaced()
        .with_max_ticks(50)
        .drive(&mut engine, |tick, output| {
            seen.push(output.copied());
            if tick == 5 {
                flag.set();
            }
        });

    assert!(report.finished);
    assert_eq!(runner.status(), RunnerStatus::Completed);
    assert_eq!(finally.load(Ordering::SeqCst), 1);
    // 1, 2, parked until tick 5, then 3, then the completing tick
    assert_eq!(
        seen,
        vec![Some(1), Some(2), None, None, None, Some(3), None]
    );
}

#[test]
fn test_nested_runners() {
    let inner: SequentialRunner<u32, String> = SequentialRunner::new();
    inner.append(values(vec![10, 11]));

    let outer: SequentialRunner<u32, String> = SequentialRunner::new();
    outer.append(values(vec![1]));
    outer.append(inner.coroutine());
    outer.append(values(vec![2]));

    let mut seen = Vec::new();
    while let Tick::Suspended(output) = outer.tick() {
        seen.push(output);
    }
    assert_eq!(seen, vec![Some(1), Some(10), Some(11), Some(2)]);
    assert_eq!(inner.status(), RunnerStatus::Completed);
    assert_eq!(outer.status(), RunnerStatus::Completed);
}

#[test]
fn test_inner_runner_failure_is_contained() {
    let inner: SequentialRunner<u32, String> = SequentialRunner::new();
    inner.append(from_fn(|| Step::fail("inner exploded")));
    let inner_error = Arc::new(Mutex::new(None));
    let sink = inner_error.clone();
    inner.on_error(move |e| *sink.lock() = Some(e.to_string()));

    let after = Arc::new(AtomicUsize::new(0));
    let a = after.clone();
    let outer: SequentialRunner<u32, String> = SequentialRunner::new();
    outer.append(inner.coroutine());
    outer.append(action(move || {
        a.fetch_add(1, Ordering::SeqCst);
    }));

    assert_eq!(outer.tick(), Tick::Finished(RunnerStatus::Completed));
    assert_eq!(inner.status(), RunnerStatus::Errored);
    assert_eq!(
        inner_error.lock().as_deref(),
        Some("task failed: inner exploded")
    );
    assert_eq!(after.load(Ordering::SeqCst), 1);
}

#[test]
fn test_timeout_with_host_clock() {
    let clock = ManualClock::new();
    let runner: SequentialRunner<u32, String> = SequentialRunner::with_clock(clock.clone());
    runner.set_timeout(Duration::from_millis(30));
    runner.append(from_fn(|| Step::Pending));
    let timed_out = Arc::new(AtomicUsize::new(0));
    let t = timed_out.clone();
    runner.on_error(move |e| {
        if e.is_timeout() {
            t.fetch_add(1, Ordering::SeqCst);
        }
    });

    let mut ticks = 0;
    while !runner.is_finished() {
        runner.tick();
        ticks += 1;
        clock.advance(Duration::from_millis(10));
    }
    // checked at 0, 10, 20 and stopped at 30
    assert_eq!(ticks, 4);
    assert_eq!(runner.status(), RunnerStatus::TimedOut);
    assert_eq!(timed_out.load(Ordering::SeqCst), 1);
}
