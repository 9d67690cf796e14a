//! The context futures are created in.

use crate::config::RuntimeConfig;
use crate::error::ConfigError;
use crate::future::{Future, Resolver};
use crate::rejection::{RejectionTracker, Subscription};
use crate::task_queue::{ContinuationQueue, DrainStats};
use core_types::{FutureId, Value};
use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

struct RuntimeShared {
    queue: ContinuationQueue,
    tracker: RejectionTracker,
    config: RuntimeConfig,
    next_id: Cell<u64>,
}

/// Bundles the continuation queue, the rejection tracker and the config.
///
/// Cloning yields another handle to the same runtime. Every future created
/// through a runtime schedules its reactions on that runtime's queue.
///
/// # Examples
///
/// ```
/// use eventual::{FutureState, Runtime};
/// use core_types::Value;
///
/// let runtime = Runtime::new();
/// let future = runtime.create(|resolver| {
///     resolver.resolve(42);
///     Ok(())
/// });
///
/// assert_eq!(future.state(), FutureState::Fulfilled);
/// assert_eq!(future.value(), Some(Value::Smi(42)));
/// ```
#[derive(Clone)]
pub struct Runtime {
    shared: Rc<RuntimeShared>,
}

impl Runtime {
    /// Creates a runtime with its own queue and the default config.
    pub fn new() -> Self {
        Self::build(ContinuationQueue::new(), RuntimeConfig::default())
    }

    /// Creates a runtime with its own queue and a validated config.
    pub fn with_config(config: RuntimeConfig) -> Result<Self, ConfigError> {
        Self::with_queue(ContinuationQueue::new(), config)
    }

    /// Creates a runtime that schedules on a host-provided queue.
    pub fn with_queue(queue: ContinuationQueue, config: RuntimeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(queue, config))
    }

    fn build(queue: ContinuationQueue, config: RuntimeConfig) -> Self {
        let tracker = RejectionTracker::new(queue.clone(), &config);
        Self {
            shared: Rc::new(RuntimeShared {
                queue,
                tracker,
                config,
                next_id: Cell::new(0),
            }),
        }
    }

    /// The continuation queue reactions run on.
    pub fn queue(&self) -> &ContinuationQueue {
        &self.shared.queue
    }

    /// The rejection tracker observing this runtime's futures.
    pub fn tracker(&self) -> &RejectionTracker {
        &self.shared.tracker
    }

    /// The config this runtime was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.shared.config
    }

    /// Runs queued continuations until none remain.
    pub fn drain(&self) -> DrainStats {
        self.shared.queue.drain()
    }

    pub(crate) fn downgrade(&self) -> WeakRuntime {
        WeakRuntime(Rc::downgrade(&self.shared))
    }

    pub(crate) fn new_future(&self) -> Future {
        let raw = self.shared.next_id.get();
        self.shared.next_id.set(raw + 1);
        Future::new(FutureId::new(raw), self.clone())
    }

    /// Creates a future and runs `executor` synchronously, once.
    ///
    /// The executor receives the future's [`Resolver`]. If it raises (returns
    /// `Err`) before resolving, the future rejects with the raised value.
    pub fn create<F>(&self, executor: F) -> Future
    where
        F: FnOnce(Resolver) -> Result<(), Value>,
    {
        let (future, resolver) = self.pending();
        if let Err(raised) = executor(resolver.clone()) {
            resolver.reject(raised);
        }
        future
    }

    /// Creates a pending future along with its resolver.
    pub fn pending(&self) -> (Future, Resolver) {
        let future = self.new_future();
        let resolver = Resolver::new(&future);
        (future, resolver)
    }

    /// Returns a future resolved with `value`.
    ///
    /// A library future is returned as-is; any other thenable is adopted.
    pub fn resolved(&self, value: impl Into<Value>) -> Future {
        let value = value.into();
        if let Some(future) = value
            .as_thenable()
            .and_then(|thenable| thenable.as_any().downcast_ref::<Future>())
        {
            return future.clone();
        }
        let (future, resolver) = self.pending();
        resolver.resolve(value);
        future
    }

    /// Returns a future rejected with `reason`.
    pub fn rejected(&self, reason: impl Into<Value>) -> Future {
        let (future, resolver) = self.pending();
        resolver.reject(reason);
        future
    }

    /// Subscribes to unhandled-rejection signals.
    pub fn on_unhandled_rejection<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&Value, &Future) + 'static,
    {
        self.shared.tracker.on_unhandled_rejection(handler)
    }

    /// Subscribes to rejection-handled signals.
    pub fn on_rejection_handled<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&Future) + 'static,
    {
        self.shared.tracker.on_rejection_handled(handler)
    }

    /// Futures currently reported as unhandled.
    pub fn unhandled_rejections(&self) -> Vec<Future> {
        self.shared.tracker.unhandled_rejections()
    }
}

/// A runtime handle that does not keep the runtime alive.
#[derive(Clone)]
pub(crate) struct WeakRuntime(Weak<RuntimeShared>);

impl WeakRuntime {
    pub(crate) fn upgrade(&self) -> Option<Runtime> {
        self.0.upgrade().map(|shared| Runtime { shared })
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("queued", &self.shared.queue.len())
            .field("config", &self.shared.config)
            .finish()
    }
}
