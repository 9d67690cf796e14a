//! Unhandled-rejection detection.
//!
//! A future that rejects with no reaction attached is marked unobserved and
//! checked again once the continuation queue empties. Each grace pass beyond
//! the first postpones the check to the next host drain, so the host can
//! attach handlers in between. If nothing was attached by the last check,
//! subscribers receive an unhandled-rejection signal. Attaching a reaction
//! afterwards produces a rejection-handled signal.
//!
//! Reported futures are remembered weakly: a rejection that nothing refers
//! to any more is released along with its reason and runtime.

use crate::config::RuntimeConfig;
use crate::future::{Future, WeakFuture};
use crate::task_queue::{ContinuationQueue, Job};
use core_types::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Where a rejected future stands with the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionState {
    /// Rejected with no reaction; a check is pending.
    Unobserved,
    /// A reaction was attached; no further signals.
    Observed,
    /// The unhandled-rejection signal fired and no reaction followed yet.
    ReportedUnhandled,
}

type UnhandledListener = Rc<RefCell<dyn FnMut(&Value, &Future)>>;
type HandledListener = Rc<RefCell<dyn FnMut(&Future)>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalKind {
    Unhandled,
    Handled,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    unhandled: Vec<(u64, UnhandledListener)>,
    handled: Vec<(u64, HandledListener)>,
}

impl Listeners {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn remove(&mut self, kind: SignalKind, id: u64) {
        match kind {
            SignalKind::Unhandled => self.unhandled.retain(|(lid, _)| *lid != id),
            SignalKind::Handled => self.handled.retain(|(lid, _)| *lid != id),
        }
    }
}

/// Handle returned by the subscription functions.
///
/// Dropping it keeps the handler registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[must_use = "dropping a Subscription keeps the handler registered"]
pub struct Subscription {
    listeners: Weak<RefCell<Listeners>>,
    kind: SignalKind,
    id: u64,
}

impl Subscription {
    /// Removes the handler. Signals already being emitted still reach it.
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().remove(self.kind, self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

struct TrackerShared {
    queue: ContinuationQueue,
    enabled: bool,
    grace_passes: u32,
    listeners: Rc<RefCell<Listeners>>,
    reported: RefCell<Vec<WeakFuture>>,
}

/// Observes settlement and attachment to detect unhandled rejections.
///
/// Cloning yields another handle to the same tracker.
///
/// # Examples
///
/// ```
/// use eventual::Runtime;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let runtime = Runtime::new();
/// let reasons = Rc::new(RefCell::new(Vec::new()));
/// let r = Rc::clone(&reasons);
/// let _sub = runtime.on_unhandled_rejection(move |reason, _future| {
///     r.borrow_mut().push(reason.to_string());
/// });
///
/// let _ignored = runtime.rejected("boom");
/// runtime.drain();
/// assert_eq!(*reasons.borrow(), vec!["boom".to_string()]);
/// ```
#[derive(Clone)]
pub struct RejectionTracker {
    shared: Rc<TrackerShared>,
}

impl RejectionTracker {
    /// Creates a tracker scheduling its checks on `queue`.
    pub fn new(queue: ContinuationQueue, config: &RuntimeConfig) -> Self {
        Self {
            shared: Rc::new(TrackerShared {
                queue,
                enabled: config.track_rejections,
                grace_passes: config.rejection_grace_passes.max(1),
                listeners: Rc::new(RefCell::new(Listeners::default())),
                reported: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Subscribes to unhandled-rejection signals.
    pub fn on_unhandled_rejection<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&Value, &Future) + 'static,
    {
        let listener: UnhandledListener = Rc::new(RefCell::new(handler));
        let mut listeners = self.shared.listeners.borrow_mut();
        let id = listeners.allocate_id();
        listeners.unhandled.push((id, listener));
        self.subscription(SignalKind::Unhandled, id)
    }

    /// Subscribes to rejection-handled signals.
    pub fn on_rejection_handled<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&Future) + 'static,
    {
        let listener: HandledListener = Rc::new(RefCell::new(handler));
        let mut listeners = self.shared.listeners.borrow_mut();
        let id = listeners.allocate_id();
        listeners.handled.push((id, listener));
        self.subscription(SignalKind::Handled, id)
    }

    fn subscription(&self, kind: SignalKind, id: u64) -> Subscription {
        Subscription {
            listeners: Rc::downgrade(&self.shared.listeners),
            kind,
            id,
        }
    }

    /// Futures currently reported as unhandled, in report order.
    ///
    /// Futures dropped by everyone else are no longer listed.
    pub fn unhandled_rejections(&self) -> Vec<Future> {
        let mut reported = self.shared.reported.borrow_mut();
        reported.retain(WeakFuture::is_alive);
        reported.iter().filter_map(WeakFuture::upgrade).collect()
    }

    /// Called when `future` settles to Rejected.
    pub(crate) fn track_rejection(&self, future: &Future, has_reactions: bool) {
        if !self.shared.enabled {
            return;
        }
        if has_reactions {
            future.set_rejection_state(RejectionState::Observed);
            return;
        }
        future.set_rejection_state(RejectionState::Unobserved);
        self.schedule_check(future.clone(), self.shared.grace_passes);
    }

    /// Called whenever a reaction is attached to `future`.
    pub(crate) fn track_handler(&self, future: &Future) {
        if !self.shared.enabled {
            return;
        }
        match future.rejection_state() {
            Some(RejectionState::Unobserved) => {
                future.set_rejection_state(RejectionState::Observed);
            }
            Some(RejectionState::ReportedUnhandled) => {
                future.set_rejection_state(RejectionState::Observed);
                self.shared
                    .reported
                    .borrow_mut()
                    .retain(|reported| reported.is_alive() && !reported.refers_to(future));
                let tracker = self.clone();
                let future = future.clone();
                self.shared
                    .queue
                    .enqueue(Job::new(move || tracker.emit_handled(&future)));
            }
            Some(RejectionState::Observed) | None => {}
        }
    }

    fn schedule_check(&self, future: Future, remaining: u32) {
        let tracker = self.clone();
        self.shared
            .queue
            .defer_until_idle(Job::new(move || tracker.check(future, remaining)));
    }

    fn schedule_next_drain_check(&self, future: Future, remaining: u32) {
        let tracker = self.clone();
        self.shared
            .queue
            .defer_until_next_drain(Job::new(move || tracker.check(future, remaining)));
    }

    fn check(&self, future: Future, remaining: u32) {
        if future.rejection_state() != Some(RejectionState::Unobserved) {
            return;
        }
        if remaining > 1 {
            self.schedule_next_drain_check(future, remaining - 1);
            return;
        }
        future.set_rejection_state(RejectionState::ReportedUnhandled);
        {
            let mut reported = self.shared.reported.borrow_mut();
            reported.retain(WeakFuture::is_alive);
            reported.push(future.downgrade());
        }
        let reason = future.reason().unwrap_or(Value::Undefined);
        self.emit_unhandled(&reason, &future);
    }

    fn emit_unhandled(&self, reason: &Value, future: &Future) {
        // Snapshot so handlers may subscribe or unsubscribe while running.
        let listeners: Vec<UnhandledListener> = self
            .shared
            .listeners
            .borrow()
            .unhandled
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        if listeners.is_empty() {
            warn!(future = %future.id(), %reason, "unhandled rejection");
            return;
        }
        debug!(future = %future.id(), listeners = listeners.len(), "reporting unhandled rejection");
        for listener in listeners {
            let mut callback = listener.borrow_mut();
            (*callback)(reason, future);
        }
    }

    fn emit_handled(&self, future: &Future) {
        let listeners: Vec<HandledListener> = self
            .shared
            .listeners
            .borrow()
            .handled
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        debug!(future = %future.id(), listeners = listeners.len(), "rejection handled late");
        for listener in listeners {
            let mut callback = listener.borrow_mut();
            (*callback)(future);
        }
    }
}

impl fmt::Debug for RejectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RejectionTracker")
            .field("enabled", &self.shared.enabled)
            .field("grace_passes", &self.shared.grace_passes)
            .field("reported", &self.shared.reported.borrow().len())
            .finish()
    }
}
