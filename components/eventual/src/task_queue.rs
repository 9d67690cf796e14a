//! Continuation queue management.
//!
//! This module provides the FIFO queue that defers future reactions to a
//! later point in control flow. Jobs never run inside the call that
//! enqueues them; they run when the host drains the queue.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace};

/// A deferred zero-argument action.
///
/// Jobs carry future reactions, adoption steps and combinator bookkeeping.
pub struct Job {
    callback: Box<dyn FnOnce()>,
}

impl Job {
    /// Creates a new Job from a closure.
    ///
    /// # Arguments
    ///
    /// * `f` - The function to execute when the job runs
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the job.
    pub fn run(self) {
        (self.callback)()
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Job {{ ... }}")
    }
}

/// Summary of one [`ContinuationQueue::drain`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Number of FIFO jobs executed
    pub jobs_run: usize,
    /// Number of times the FIFO emptied and idle checks ran
    pub passes: usize,
}

#[derive(Debug, Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    idle: Vec<Job>,
    next_drain: Vec<Job>,
    draining: bool,
    total_enqueued: u64,
}

/// The FIFO scheduler for deferred continuations.
///
/// Cloning yields another handle to the same queue. The host constructs the
/// queue and decides when to drain it.
///
/// # Examples
///
/// ```
/// use eventual::{ContinuationQueue, Job};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let queue = ContinuationQueue::new();
/// let order = Rc::new(RefCell::new(Vec::new()));
///
/// let o = Rc::clone(&order);
/// queue.enqueue(Job::new(move || o.borrow_mut().push(1)));
/// let o = Rc::clone(&order);
/// queue.enqueue(Job::new(move || o.borrow_mut().push(2)));
///
/// assert!(order.borrow().is_empty());
/// queue.drain();
/// assert_eq!(*order.borrow(), vec![1, 2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContinuationQueue {
    state: Rc<RefCell<QueueState>>,
}

/// Clears the draining flag even if a job unwinds.
struct DrainGuard<'a>(&'a RefCell<QueueState>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().draining = false;
    }
}

impl ContinuationQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job to the end of the queue.
    pub fn enqueue(&self, job: Job) {
        let mut state = self.state.borrow_mut();
        state.jobs.push_back(job);
        state.total_enqueued += 1;
        trace!(pending = state.jobs.len(), "continuation job enqueued");
    }

    /// Registers a job that runs once the FIFO is empty.
    ///
    /// Idle jobs run at the end of the current (or next) drain pass, after
    /// every job already enqueued and every job those jobs enqueue.
    pub fn defer_until_idle(&self, job: Job) {
        self.state.borrow_mut().idle.push(job);
    }

    /// Registers an idle job for the next call to [`drain`](Self::drain).
    ///
    /// The job runs when that drain first empties the FIFO. Work done in
    /// the current drain, and by the host before draining again, comes first.
    pub fn defer_until_next_drain(&self, job: Job) {
        self.state.borrow_mut().next_drain.push(job);
    }

    /// Removes and runs the job at the head of the queue.
    ///
    /// Returns false if the queue was empty.
    pub fn run_next(&self) -> bool {
        // The borrow must end before the job runs so it can enqueue more work.
        let job = self.state.borrow_mut().jobs.pop_front();
        match job {
            Some(job) => {
                job.run();
                true
            }
            None => false,
        }
    }

    /// Runs jobs until the queue and its idle checks are exhausted.
    ///
    /// Jobs enqueued while draining are processed in the same call. A call
    /// made from inside a running job returns immediately; the outer drain
    /// picks up the remaining work.
    pub fn drain(&self) -> DrainStats {
        {
            let mut state = self.state.borrow_mut();
            if state.draining {
                return DrainStats::default();
            }
            state.draining = true;
            let carried = std::mem::take(&mut state.next_drain);
            state.idle.extend(carried);
        }
        let _guard = DrainGuard(&self.state);

        let mut stats = DrainStats::default();
        loop {
            while self.run_next() {
                stats.jobs_run += 1;
            }
            stats.passes += 1;

            let idle = std::mem::take(&mut self.state.borrow_mut().idle);
            if idle.is_empty() {
                break;
            }
            for job in idle {
                job.run();
            }
        }

        debug!(
            jobs_run = stats.jobs_run,
            passes = stats.passes,
            "continuation queue drained"
        );
        stats
    }

    /// Returns true if no FIFO job is waiting.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().jobs.is_empty()
    }

    /// Returns the number of FIFO jobs waiting.
    pub fn len(&self) -> usize {
        self.state.borrow().jobs.len()
    }

    /// Returns the number of idle checks waiting for the end of a pass.
    pub fn idle_len(&self) -> usize {
        self.state.borrow().idle.len()
    }

    /// Returns the number of jobs waiting for the next drain.
    pub fn deferred_len(&self) -> usize {
        self.state.borrow().next_drain.len()
    }

    /// Total number of jobs ever enqueued on this queue.
    pub fn total_enqueued(&self) -> u64 {
        self.state.borrow().total_enqueued
    }
}
