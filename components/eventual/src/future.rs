//! Eventual-value container with chained continuations.
//!
//! A [`Future`] starts pending and settles exactly once, to fulfilled with a
//! value or rejected with a reason. Reactions attached through
//! [`Future::attach`] run later, from the continuation queue, in the order
//! they were attached.

use crate::rejection::RejectionState;
use crate::runtime::{Runtime, WeakRuntime};
use crate::task_queue::Job;
use core_types::{Continuation, FutureError, FutureId, Outcome, Thenable, Value};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// The state of a Future.
///
/// Once settled (Fulfilled or Rejected), a Future cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureState {
    /// Neither fulfilled nor rejected yet.
    Pending,
    /// Settled with a value.
    Fulfilled,
    /// Settled with a reason.
    Rejected,
}

impl FutureState {
    /// Returns true once the future is fulfilled or rejected.
    pub fn is_settled(self) -> bool {
        !matches!(self, FutureState::Pending)
    }
}

/// A fulfillment or rejection handler passed to [`Future::attach`].
///
/// Returning `Ok` resolves the downstream future with the value (adopting
/// it if it is a thenable). Returning `Err` raises the value: the
/// downstream future rejects with it.
pub struct Handler {
    callback: Box<dyn FnOnce(Value) -> Result<Value, Value>>,
}

impl Handler {
    /// Creates a new Handler from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Value) -> Result<Value, Value> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Calls the handler with the settled outcome.
    pub fn call(self, arg: Value) -> Result<Value, Value> {
        (self.callback)(arg)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler {{ ... }}")
    }
}

/// A reaction to be triggered when a Future settles.
pub(crate) enum Reaction {
    /// Handlers registered via `attach`, feeding a downstream future.
    Chain {
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
        downstream: Future,
    },
    /// Library continuations for adoption and combinator bookkeeping.
    Internal {
        on_fulfilled: Continuation,
        on_rejected: Continuation,
    },
}

impl Reaction {
    fn run(self, state: FutureState, outcome: Value) {
        let fulfilled = state == FutureState::Fulfilled;
        match self {
            Reaction::Chain {
                on_fulfilled,
                on_rejected,
                downstream,
            } => {
                let resolver = Resolver::new(&downstream);
                let handler = if fulfilled { on_fulfilled } else { on_rejected };
                match handler {
                    Some(handler) => match handler.call(outcome) {
                        Ok(value) => resolver.resolve(value),
                        Err(raised) => resolver.reject(raised),
                    },
                    None if fulfilled => resolver.resolve(outcome),
                    None => resolver.reject(outcome),
                }
            }
            Reaction::Internal {
                on_fulfilled,
                on_rejected,
            } => {
                if fulfilled {
                    on_fulfilled(outcome)
                } else {
                    on_rejected(outcome)
                }
            }
        }
    }
}

pub(crate) struct FutureInner {
    id: FutureId,
    state: FutureState,
    outcome: Option<Value>,
    reactions: Vec<Reaction>,
    /// The library future this one is waiting to adopt, if any.
    adopting: Option<Weak<RefCell<FutureInner>>>,
    rejection: Option<RejectionState>,
}

/// An eventual value.
///
/// Cloning yields another handle to the same future. Futures are created
/// through a [`Runtime`], which supplies the continuation queue their
/// reactions run on.
///
/// # Examples
///
/// ```
/// use eventual::{FutureState, Runtime};
/// use core_types::Value;
///
/// let runtime = Runtime::new();
/// let doubled = runtime
///     .resolved(21)
///     .then(|v| match v {
///         Value::Smi(n) => Ok(Value::Smi(n * 2)),
///         other => Err(other),
///     });
///
/// assert_eq!(doubled.state(), FutureState::Pending);
/// runtime.drain();
/// assert_eq!(doubled.value(), Some(Value::Smi(42)));
/// ```
#[derive(Clone)]
pub struct Future {
    inner: Rc<RefCell<FutureInner>>,
    runtime: Runtime,
}

impl Future {
    pub(crate) fn new(id: FutureId, runtime: Runtime) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FutureInner {
                id,
                state: FutureState::Pending,
                outcome: None,
                reactions: Vec::new(),
                adopting: None,
                rejection: None,
            })),
            runtime,
        }
    }

    /// The identity of this future.
    pub fn id(&self) -> FutureId {
        self.inner.borrow().id
    }

    /// The current state.
    pub fn state(&self) -> FutureState {
        self.inner.borrow().state
    }

    /// Returns true while the future is pending.
    pub fn is_pending(&self) -> bool {
        self.state() == FutureState::Pending
    }

    /// The fulfillment value, if fulfilled.
    pub fn value(&self) -> Option<Value> {
        let inner = self.inner.borrow();
        match inner.state {
            FutureState::Fulfilled => inner.outcome.clone(),
            _ => None,
        }
    }

    /// The rejection reason, if rejected.
    pub fn reason(&self) -> Option<Value> {
        let inner = self.inner.borrow();
        match inner.state {
            FutureState::Rejected => inner.outcome.clone(),
            _ => None,
        }
    }

    /// The settled outcome, or `None` while pending.
    pub fn outcome(&self) -> Option<Outcome> {
        let inner = self.inner.borrow();
        let outcome = inner.outcome.clone()?;
        match inner.state {
            FutureState::Pending => None,
            FutureState::Fulfilled => Some(Outcome::Fulfilled(outcome)),
            FutureState::Rejected => Some(Outcome::Rejected(outcome)),
        }
    }

    /// Number of reactions waiting for settlement.
    pub fn reaction_count(&self) -> usize {
        self.inner.borrow().reactions.len()
    }

    /// Where this future stands with the rejection tracker, if rejected.
    pub fn rejection_state(&self) -> Option<RejectionState> {
        self.inner.borrow().rejection
    }

    /// The runtime this future schedules on.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Returns true if both handles refer to the same future.
    pub fn ptr_eq(&self, other: &Future) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Wraps this future as a thenable value.
    pub fn to_value(&self) -> Value {
        Value::Thenable(Rc::new(self.clone()))
    }

    pub(crate) fn downgrade(&self) -> WeakFuture {
        WeakFuture {
            inner: Rc::downgrade(&self.inner),
            runtime: self.runtime.downgrade(),
        }
    }

    pub(crate) fn set_rejection_state(&self, state: RejectionState) {
        self.inner.borrow_mut().rejection = Some(state);
    }

    /// Adds handlers for fulfillment and/or rejection.
    ///
    /// Returns a new pending Future immediately. Exactly one handler runs,
    /// from the continuation queue, once this future settles. A missing
    /// handler passes the outcome through unchanged.
    ///
    /// # Arguments
    ///
    /// * `on_fulfilled` - Optional handler called when the Future fulfills
    /// * `on_rejected` - Optional handler called when the Future rejects
    pub fn attach(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Future {
        let downstream = self.runtime.new_future();
        self.add_reaction(Reaction::Chain {
            on_fulfilled,
            on_rejected,
            downstream: downstream.clone(),
        });
        downstream
    }

    /// Attaches a fulfillment handler only.
    pub fn then<F>(&self, on_fulfilled: F) -> Future
    where
        F: FnOnce(Value) -> Result<Value, Value> + 'static,
    {
        self.attach(Some(Handler::new(on_fulfilled)), None)
    }

    /// Attaches a rejection handler only.
    pub fn catch<F>(&self, on_rejected: F) -> Future
    where
        F: FnOnce(Value) -> Result<Value, Value> + 'static,
    {
        self.attach(None, Some(Handler::new(on_rejected)))
    }

    /// Runs `on_settled` on either outcome, then passes the original
    /// outcome through.
    ///
    /// If `on_settled` raises, the downstream future rejects with the raised
    /// value instead. If it returns a thenable, the original outcome passes
    /// through only after that thenable fulfills.
    pub fn finally<F>(&self, on_settled: F) -> Future
    where
        F: FnOnce() -> Result<Value, Value> + 'static,
    {
        let slot = Rc::new(Cell::new(Some(on_settled)));
        let on_fulfilled = {
            let slot = Rc::clone(&slot);
            let runtime = self.runtime.clone();
            move |value| run_finally(&runtime, &slot, Ok(value))
        };
        let runtime = self.runtime.clone();
        let on_rejected = move |reason| run_finally(&runtime, &slot, Err(reason));
        self.attach(
            Some(Handler::new(on_fulfilled)),
            Some(Handler::new(on_rejected)),
        )
    }

    /// Registers library continuations that count as handlers but produce
    /// no downstream future.
    pub(crate) fn subscribe<F, R>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: FnOnce(Value) + 'static,
        R: FnOnce(Value) + 'static,
    {
        self.add_reaction(Reaction::Internal {
            on_fulfilled: Box::new(on_fulfilled),
            on_rejected: Box::new(on_rejected),
        });
    }

    fn add_reaction(&self, reaction: Reaction) {
        let settled = {
            let mut inner = self.inner.borrow_mut();
            match inner.state {
                FutureState::Pending => {
                    inner.reactions.push(reaction);
                    None
                }
                state => {
                    let outcome = inner.outcome.clone().unwrap_or(Value::Undefined);
                    Some((state, outcome, reaction))
                }
            }
        };
        self.runtime.tracker().track_handler(self);
        if let Some((state, outcome, reaction)) = settled {
            self.schedule(reaction, state, outcome);
        }
    }

    fn schedule(&self, reaction: Reaction, state: FutureState, outcome: Value) {
        self.runtime
            .queue()
            .enqueue(Job::new(move || reaction.run(state, outcome)));
    }

    /// Resolves with `value`, adopting it if it is a thenable.
    pub(crate) fn resolve_value(&self, value: Value) {
        let thenable = match &value {
            Value::Thenable(thenable) => Rc::clone(thenable),
            _ => return self.settle(FutureState::Fulfilled, value),
        };

        if self.adoption_cycle(&thenable) {
            debug!(future = %self.id(), "adoption cycle detected");
            let reason = Value::error(FutureError::Cycle(self.id()));
            return self.settle(FutureState::Rejected, reason);
        }

        if let Some(target) = thenable.as_any().downcast_ref::<Future>() {
            self.inner.borrow_mut().adopting = Some(Rc::downgrade(&target.inner));
        }
        trace!(future = %self.id(), "adopting thenable");

        let this = self.clone();
        self.runtime.queue().enqueue(Job::new(move || {
            let resolver = Resolver::new(&this);
            let on_fulfilled = {
                let resolver = resolver.clone();
                move |value| resolver.resolve(value)
            };
            let on_rejected = {
                let resolver = resolver.clone();
                move |reason| resolver.reject(reason)
            };
            if let Err(raised) =
                thenable.attach_continuations(Box::new(on_fulfilled), Box::new(on_rejected))
            {
                resolver.reject(raised);
            }
        }));
    }

    /// True if adopting `thenable` would make this future wait on itself.
    fn adoption_cycle(&self, thenable: &Rc<dyn Thenable>) -> bool {
        let id = self.id();
        if thenable.future_id() == Some(id) {
            return true;
        }
        let mut next = thenable
            .as_any()
            .downcast_ref::<Future>()
            .map(|future| Rc::clone(&future.inner));
        while let Some(inner) = next {
            let candidate = {
                let inner = inner.borrow();
                if inner.id == id {
                    return true;
                }
                inner.adopting.as_ref().and_then(Weak::upgrade)
            };
            next = candidate;
        }
        false
    }

    /// Transitions out of Pending and dispatches the reactions.
    ///
    /// No-op if already settled.
    pub(crate) fn settle(&self, state: FutureState, outcome: Value) {
        let reactions = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_settled() {
                return;
            }
            inner.state = state;
            inner.outcome = Some(outcome.clone());
            inner.adopting = None;
            std::mem::take(&mut inner.reactions)
        };
        trace!(future = %self.id(), ?state, reactions = reactions.len(), "future settled");

        if state == FutureState::Rejected {
            self.runtime
                .tracker()
                .track_rejection(self, !reactions.is_empty());
        }
        for reaction in reactions {
            self.schedule(reaction, state, outcome.clone());
        }
    }
}

fn run_finally<F>(
    runtime: &Runtime,
    slot: &Cell<Option<F>>,
    original: Result<Value, Value>,
) -> Result<Value, Value>
where
    F: FnOnce() -> Result<Value, Value>,
{
    let Some(on_settled) = slot.take() else {
        return original;
    };
    let returned = on_settled()?;
    if returned.as_thenable().is_some() {
        let waited = runtime.resolved(returned).then(move |_| original);
        return Ok(waited.to_value());
    }
    original
}

impl Thenable for Future {
    fn attach_continuations(
        &self,
        on_fulfilled: Continuation,
        on_rejected: Continuation,
    ) -> Result<(), Value> {
        self.add_reaction(Reaction::Internal {
            on_fulfilled,
            on_rejected,
        });
        Ok(())
    }

    fn future_id(&self) -> Option<FutureId> {
        Some(self.id())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<Future> for Value {
    fn from(future: Future) -> Self {
        Value::Thenable(Rc::new(future))
    }
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Future")
            .field("id", &inner.id)
            .field("state", &inner.state)
            .field("outcome", &inner.outcome)
            .field("reactions", &inner.reactions.len())
            .finish()
    }
}

/// A future handle that does not keep the future or its runtime alive.
#[derive(Clone)]
pub(crate) struct WeakFuture {
    inner: Weak<RefCell<FutureInner>>,
    runtime: WeakRuntime,
}

impl WeakFuture {
    pub(crate) fn upgrade(&self) -> Option<Future> {
        Some(Future {
            inner: self.inner.upgrade()?,
            runtime: self.runtime.upgrade()?,
        })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub(crate) fn refers_to(&self, future: &Future) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Rc::as_ptr(&future.inner))
    }
}

/// The paired resolve and reject functions of a future.
///
/// Clones share one "already resolved" flag: whichever of `resolve` or
/// `reject` is called first, on any clone, wins and later calls are no-ops.
#[derive(Clone)]
pub struct Resolver {
    future: Future,
    already_resolved: Rc<Cell<bool>>,
}

impl Resolver {
    pub(crate) fn new(future: &Future) -> Self {
        Self {
            future: future.clone(),
            already_resolved: Rc::new(Cell::new(false)),
        }
    }

    /// Resolves the future with a value.
    ///
    /// A thenable value is adopted: the future settles later, matching the
    /// thenable's outcome. A future resolved with itself rejects with a
    /// cycle error.
    pub fn resolve(&self, value: impl Into<Value>) {
        if self.already_resolved.replace(true) {
            return;
        }
        self.future.resolve_value(value.into());
    }

    /// Rejects the future with any reason.
    pub fn reject(&self, reason: impl Into<Value>) {
        if self.already_resolved.replace(true) {
            return;
        }
        self.future.settle(FutureState::Rejected, reason.into());
    }

    /// Returns true once either function has been called.
    pub fn is_resolved(&self) -> bool {
        self.already_resolved.get()
    }

    /// The future these functions settle.
    pub fn future(&self) -> &Future {
        &self.future
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("future", &self.future.id())
            .field("already_resolved", &self.already_resolved.get())
            .finish()
    }
}
