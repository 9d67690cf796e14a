//! Event loop implementation.
//!
//! This module provides a host loop that interleaves macrotasks, virtual
//! clock timers and full drains of the continuation queue.

use crate::error::{RuntimeError, RuntimeResult};
use crate::future::Future;
use crate::runtime::Runtime;
use crate::task_queue::DrainStats;
use core_types::Value;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::rc::Rc;
use tracing::{trace, warn};

/// A macrotask to be executed by the event loop.
///
/// Returning `Err` raises the value; [`EventLoop::run_until_done`] stops and
/// reports it.
pub struct Task {
    callback: Box<dyn FnOnce() -> Result<(), Value>>,
}

impl Task {
    /// Creates a new Task from a closure.
    ///
    /// # Arguments
    ///
    /// * `f` - The function to execute when the task runs
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), Value> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    pub fn run(self) -> Result<(), Value> {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// A queue for tasks.
///
/// Tasks are processed in FIFO order, one at a time.
#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: VecDeque<Task>,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a task to the end of the queue.
    pub fn enqueue(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    /// Removes and returns the next task from the queue.
    pub fn dequeue(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Identifies a timer registered with [`TimerHandle::set_timeout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct Timer {
    due_ms: u64,
    id: TimerId,
    callback: Box<dyn FnOnce()>,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    // Reversed so the max-heap pops the earliest due, then earliest registered.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.id.0.cmp(&self.id.0))
    }
}

#[derive(Default)]
struct TimerState {
    now_ms: u64,
    next_id: u64,
    heap: BinaryHeap<Timer>,
}

/// Registers timers on a virtual millisecond clock.
///
/// Cloning yields another handle to the same timer set, so handlers and
/// tasks can schedule timers while the loop runs.
#[derive(Clone)]
pub struct TimerHandle {
    state: Rc<RefCell<TimerState>>,
    runtime: Runtime,
}

impl TimerHandle {
    fn new(runtime: Runtime) -> Self {
        Self {
            state: Rc::new(RefCell::new(TimerState::default())),
            runtime,
        }
    }

    /// Runs `callback` once `delay_ms` virtual milliseconds have elapsed.
    ///
    /// Timers due at the same instant fire in registration order.
    pub fn set_timeout<F>(&self, delay_ms: u64, callback: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let due_ms = state.now_ms.saturating_add(delay_ms);
        state.heap.push(Timer {
            due_ms,
            id,
            callback: Box::new(callback),
        });
        trace!(timer = id.0, due_ms, "timer registered");
        id
    }

    /// Returns a future that fulfills with `value` after `delay_ms`.
    pub fn delay(&self, delay_ms: u64, value: impl Into<Value>) -> Future {
        let value = value.into();
        let (future, resolver) = self.runtime.pending();
        self.set_timeout(delay_ms, move || resolver.resolve(value));
        future
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }

    /// Number of timers that have not fired yet.
    pub fn pending_count(&self) -> usize {
        self.state.borrow().heap.len()
    }

    /// Advances the clock to the earliest timer and removes it.
    fn pop_next(&self) -> Option<Box<dyn FnOnce()>> {
        let mut state = self.state.borrow_mut();
        let timer = state.heap.pop()?;
        let now_ms = state.now_ms.max(timer.due_ms);
        state.now_ms = now_ms;
        trace!(timer = timer.id.0, now_ms, "timer fired");
        Some(timer.callback)
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TimerHandle")
            .field("now_ms", &state.now_ms)
            .field("pending", &state.heap.len())
            .finish()
    }
}

/// The host event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Takes the oldest task from the task queue and executes it, or, if no
///    task is waiting, advances the virtual clock to the next timer and
///    fires it
/// 2. Drains the continuation queue completely
/// 3. Repeats
///
/// # Examples
///
/// ```
/// use eventual::{race, EventLoop};
/// use core_types::Value;
///
/// let mut event_loop = EventLoop::new();
/// let timers = event_loop.timers();
/// let runtime = event_loop.runtime().clone();
///
/// let winner = race(&runtime, vec![timers.delay(100, "slow"), timers.delay(10, "fast")]);
/// event_loop.run_until_done().unwrap();
///
/// assert_eq!(winner.value(), Some(Value::from("fast")));
/// assert_eq!(event_loop.now_ms(), 100);
/// ```
#[derive(Debug)]
pub struct EventLoop {
    runtime: Runtime,
    task_queue: TaskQueue,
    timers: TimerHandle,
}

impl EventLoop {
    /// Creates an EventLoop over a fresh default runtime.
    pub fn new() -> Self {
        Self::with_runtime(Runtime::new())
    }

    /// Creates an EventLoop driving an existing runtime.
    pub fn with_runtime(runtime: Runtime) -> Self {
        Self {
            timers: TimerHandle::new(runtime.clone()),
            runtime,
            task_queue: TaskQueue::new(),
        }
    }

    /// The runtime whose continuation queue this loop drains.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// A handle for registering timers.
    pub fn timers(&self) -> TimerHandle {
        self.timers.clone()
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&mut self, task: Task) {
        self.task_queue.enqueue(task);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.task_queue.is_empty()
    }

    /// Returns true if no continuation is waiting.
    pub fn is_continuation_queue_empty(&self) -> bool {
        self.runtime.queue().is_empty()
    }

    /// Returns true if there is nothing left to run.
    pub fn is_idle(&self) -> bool {
        self.task_queue.is_empty()
            && self.timers.pending_count() == 0
            && self.runtime.queue().is_empty()
            && self.runtime.queue().idle_len() == 0
            && self.runtime.queue().deferred_len() == 0
    }

    /// Drains the continuation queue completely.
    pub fn drain_continuations(&self) -> DrainStats {
        self.runtime.drain()
    }

    /// Processes one complete cycle: one task or timer followed by a full
    /// continuation drain.
    ///
    /// Returns false if there was no task or timer to run.
    pub fn process_one_cycle(&mut self) -> RuntimeResult<bool> {
        let ran = if let Some(task) = self.task_queue.dequeue() {
            if let Err(raised) = task.run() {
                warn!(%raised, "task raised");
                return Err(RuntimeError::TaskFailed(raised));
            }
            true
        } else if let Some(callback) = self.timers.pop_next() {
            callback();
            true
        } else {
            false
        };

        self.drain_continuations();
        Ok(ran)
    }

    /// Runs the event loop until all tasks, timers and continuations are
    /// processed.
    ///
    /// # Returns
    ///
    /// `Ok(())` if every task completed, or the value the first failing task
    /// raised.
    pub fn run_until_done(&mut self) -> RuntimeResult<()> {
        self.drain_continuations();
        loop {
            let ran = self.process_one_cycle()?;
            // A cycle with nothing to run still drains, releasing checks
            // that wait for the next drain.
            if !ran && self.runtime.queue().deferred_len() == 0 {
                return Ok(());
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
