//! Task 单元测试
//!
//! 测试 Step 辅助方法、任务 ID 与 Awaitable 句柄

use crate::runtime::task::{poll_fn, AwaitFlag, Awaitable, Step, Task, TaskId, TaskIdGenerator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Counter {
    left: u32,
}

impl Task<u32> for Counter {
    fn step(&mut self) -> Step<u32> {
        if self.left == 0 {
            return Step::Complete;
        }
        self.left -= 1;
        Step::Yield(self.left)
    }
}

#[test]
fn test_boxed_task_delegates() {
    let mut task: Box<dyn Task<u32>> = Box::new(Counter { left: 1 });
    assert!(matches!(task.step(), Step::Yield(0)));
    assert!(task.step().is_complete());
}

#[test]
fn test_step_map_yielded() {
    let step: Step<i32> = Step::Yield(21);
    assert!(matches!(step.map_yielded(|v| v * 2), Step::Yield(42)));

    let step: Step<i32> = Step::Pending;
    assert!(matches!(step.map_yielded(|v| v * 2), Step::Pending));
}

#[test]
fn test_step_fail_carries_message() {
    let step: Step<()> = Step::fail("disk on fire");
    assert!(step.is_fail());
    match step {
        Step::Fail(e) => assert_eq!(e.to_string(), "disk on fire"),
        _ => unreachable!(),
    }
}

#[test]
fn test_step_debug() {
    let debug = format!("{:?}", Step::nest(Counter { left: 3 }));
    assert_eq!(debug, "Nest(..)");
    assert_eq!(format!("{:?}", Step::<u8>::Yield(5)), "Yield(5)");
}

#[test]
fn test_task_id_display() {
    assert_eq!(TaskId(3).to_string(), "Task(3)");
    assert_eq!(TaskId::from(9).inner(), 9);
}

#[test]
fn test_task_id_generator_sequential() {
    let mut ids = TaskIdGenerator::new();
    assert_eq!(ids.next(), TaskId(0));
    assert_eq!(ids.next(), TaskId(1));
    assert_eq!(ids.next(), TaskId(2));
}

#[test]
fn test_await_flag_shared_between_clones() {
    let flag = AwaitFlag::new();
    let handle = flag.clone();
    assert!(!handle.is_done());
    flag.set();
    assert!(handle.is_done());
    flag.reset();
    assert!(!handle.is_done());
}

#[test]
fn test_poll_fn_reads_predicate() {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = polls.clone();
    let awaitable = poll_fn(move || counter.load(Ordering::SeqCst) >= 2);
    assert!(!awaitable.is_done());
    polls.store(2, Ordering::SeqCst);
    assert!(awaitable.is_done());
}
