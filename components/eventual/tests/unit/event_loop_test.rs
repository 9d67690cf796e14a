//! Unit tests for EventLoop and timers

use core_types::Value;
use eventual::{race, EventLoop, Runtime, RuntimeConfig, RuntimeError, Task};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn race_of_delays_picks_the_shorter_one() {
    let mut event_loop = EventLoop::new();
    let timers = event_loop.timers();
    let runtime = event_loop.runtime().clone();

    let winner = race(
        &runtime,
        vec![timers.delay(100, "slow"), timers.delay(10, "fast")],
    );
    event_loop.run_until_done().unwrap();

    assert_eq!(winner.value(), Some(Value::from("fast")));
    assert_eq!(event_loop.now_ms(), 100);
    assert!(event_loop.is_idle());
}

#[test]
fn timeout_rejects_a_slow_operation() {
    let mut event_loop = EventLoop::new();
    let timers = event_loop.timers();
    let runtime = event_loop.runtime().clone();

    let operation = timers.delay(50, "result");
    let timeout = timers
        .delay(20, Value::Undefined)
        .then(|_| Err(Value::from("timeout")));
    let guarded = race(&runtime, vec![operation, timeout]);
    event_loop.run_until_done().unwrap();

    assert_eq!(guarded.reason(), Some(Value::from("timeout")));
}

#[test]
fn continuations_run_between_tasks() {
    let mut event_loop = EventLoop::new();
    let runtime = event_loop.runtime().clone();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = Rc::clone(&log);
    event_loop.enqueue_task(Task::new(move || {
        l.borrow_mut().push("task 1");
        let l = Rc::clone(&l);
        let _tail = runtime.resolved(Value::Undefined).then(move |v| {
            l.borrow_mut().push("continuation");
            Ok(v)
        });
        Ok(())
    }));
    let l = Rc::clone(&log);
    event_loop.enqueue_task(Task::new(move || {
        l.borrow_mut().push("task 2");
        Ok(())
    }));

    assert!(event_loop.process_one_cycle().unwrap());
    assert_eq!(*log.borrow(), vec!["task 1", "continuation"]);
    assert!(event_loop.process_one_cycle().unwrap());
    assert!(!event_loop.process_one_cycle().unwrap());
    assert_eq!(*log.borrow(), vec!["task 1", "continuation", "task 2"]);
}

#[test]
fn tasks_run_before_timers() {
    let mut event_loop = EventLoop::new();
    let timers = event_loop.timers();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = Rc::clone(&log);
    timers.set_timeout(0, move || l.borrow_mut().push("timer"));
    let l = Rc::clone(&log);
    event_loop.enqueue_task(Task::new(move || {
        l.borrow_mut().push("task");
        Ok(())
    }));

    event_loop.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec!["task", "timer"]);
    assert_eq!(event_loop.now_ms(), 0);
}

#[test]
fn task_failure_is_returned() {
    let mut event_loop = EventLoop::new();
    let ran = Rc::new(RefCell::new(false));
    event_loop.enqueue_task(Task::new(|| Err(Value::from("broken"))));
    let r = Rc::clone(&ran);
    event_loop.enqueue_task(Task::new(move || {
        *r.borrow_mut() = true;
        Ok(())
    }));

    match event_loop.run_until_done() {
        Err(RuntimeError::TaskFailed(raised)) => assert_eq!(raised, Value::from("broken")),
        other => panic!("expected task failure, got {:?}", other),
    }
    assert!(!*ran.borrow());
    assert!(!event_loop.is_task_queue_empty());
}

#[test]
fn unhandled_rejection_from_timer_is_reported() {
    let mut event_loop = EventLoop::new();
    let timers = event_loop.timers();
    let reasons = Rc::new(RefCell::new(Vec::new()));
    let r = Rc::clone(&reasons);
    let _sub = event_loop
        .runtime()
        .on_unhandled_rejection(move |reason, _| r.borrow_mut().push(reason.clone()));

    let _failed = timers
        .delay(5, 1)
        .then(|_| Err(Value::from("late failure")));
    event_loop.run_until_done().unwrap();

    assert_eq!(*reasons.borrow(), vec![Value::from("late failure")]);
}

#[test]
fn run_until_done_finishes_pending_grace_checks() {
    let config = RuntimeConfig {
        rejection_grace_passes: 3,
        ..RuntimeConfig::default()
    };
    let runtime = Runtime::with_config(config).unwrap();
    let mut event_loop = EventLoop::with_runtime(runtime.clone());
    let reported = Rc::new(RefCell::new(0));
    let r = Rc::clone(&reported);
    let _sub = runtime.on_unhandled_rejection(move |_, _| *r.borrow_mut() += 1);

    let _failed = runtime.rejected("x");
    event_loop.run_until_done().unwrap();

    assert_eq!(*reported.borrow(), 1);
    assert!(event_loop.is_idle());
}

#[test]
fn loop_can_share_a_configured_runtime() {
    let runtime = Runtime::new();
    let mut event_loop = EventLoop::with_runtime(runtime.clone());
    let doubled = event_loop
        .timers()
        .delay(1, 21)
        .then(|v| match v {
            Value::Smi(n) => Ok(Value::Smi(n * 2)),
            other => Err(other),
        });
    event_loop.run_until_done().unwrap();
    assert_eq!(doubled.value(), Some(Value::Smi(42)));
    assert!(runtime.queue().is_empty());
}
