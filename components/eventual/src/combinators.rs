//! Composition of several futures into one.
//!
//! Every combinator accepts a sequence of values. Library futures are used
//! as-is, other thenables are adopted, and plain values count as
//! already-fulfilled futures. None of them cancels an input it no longer
//! needs: abandoned inputs keep running and their settlements are ignored.

use crate::future::Future;
use crate::runtime::Runtime;
use core_types::{FutureError, Outcome, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Bookkeeping for [`join_all`]: fulfillment values by input index.
#[derive(Debug, Clone)]
pub struct JoinAllTracker {
    values: BTreeMap<usize, Value>,
    total: usize,
    settled: bool,
}

impl JoinAllTracker {
    /// Creates a tracker expecting `total` inputs.
    pub fn new(total: usize) -> Self {
        Self {
            values: BTreeMap::new(),
            total,
            settled: false,
        }
    }

    /// Records the value of input `index`.
    ///
    /// Returns true when this was the last missing value. Ignored once the
    /// result has settled.
    pub fn record_fulfillment(&mut self, index: usize, value: Value) -> bool {
        if self.settled {
            return false;
        }
        self.values.insert(index, value);
        if self.values.len() == self.total {
            self.settled = true;
            return true;
        }
        false
    }

    /// Marks the result as settled; later records are ignored.
    pub fn mark_settled(&mut self) {
        self.settled = true;
    }

    /// Number of inputs fulfilled so far.
    pub fn fulfilled_count(&self) -> usize {
        self.values.len()
    }

    /// Values in input order, `Undefined` for inputs not yet fulfilled.
    pub fn collect_values(&self) -> Vec<Value> {
        (0..self.total)
            .map(|index| self.values.get(&index).cloned().unwrap_or(Value::Undefined))
            .collect()
    }
}

/// Bookkeeping for [`settle_all`]: outcomes by input index.
#[derive(Debug, Clone)]
pub struct SettleAllTracker {
    outcomes: BTreeMap<usize, Outcome>,
    total: usize,
}

impl SettleAllTracker {
    /// Creates a tracker expecting `total` inputs.
    pub fn new(total: usize) -> Self {
        Self {
            outcomes: BTreeMap::new(),
            total,
        }
    }

    /// Records the outcome of input `index`. Returns true once every input
    /// has settled.
    pub fn record(&mut self, index: usize, outcome: Outcome) -> bool {
        self.outcomes.insert(index, outcome);
        self.outcomes.len() == self.total
    }

    /// Outcome descriptors in input order.
    pub fn collect_outcomes(&self) -> Vec<Value> {
        self.outcomes.values().cloned().map(Value::from).collect()
    }
}

/// Bookkeeping for [`first_success`]: rejection reasons by input index.
#[derive(Debug, Clone)]
pub struct FirstSuccessTracker {
    reasons: BTreeMap<usize, Value>,
    total: usize,
    settled: bool,
}

impl FirstSuccessTracker {
    /// Creates a tracker expecting `total` inputs.
    pub fn new(total: usize) -> Self {
        Self {
            reasons: BTreeMap::new(),
            total,
            settled: false,
        }
    }

    /// Records the rejection reason of input `index`.
    ///
    /// Returns true when every input has rejected. Ignored once the result
    /// has settled.
    pub fn record_rejection(&mut self, index: usize, reason: Value) -> bool {
        if self.settled {
            return false;
        }
        self.reasons.insert(index, reason);
        if self.reasons.len() == self.total {
            self.settled = true;
            return true;
        }
        false
    }

    /// Marks the result as settled; later records are ignored.
    pub fn mark_settled(&mut self) {
        self.settled = true;
    }

    /// Reasons in input order, `Undefined` for inputs not yet rejected.
    pub fn collect_reasons(&self) -> Vec<Value> {
        (0..self.total)
            .map(|index| self.reasons.get(&index).cloned().unwrap_or(Value::Undefined))
            .collect()
    }
}

fn to_futures<I>(runtime: &Runtime, inputs: I) -> Vec<Future>
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    inputs
        .into_iter()
        .map(|input| runtime.resolved(input))
        .collect()
}

/// Fulfills with every input's value, in input order.
///
/// Rejects with the reason of the first input to reject, by settlement
/// time. An empty input fulfills immediately with an empty array.
///
/// # Examples
///
/// ```
/// use eventual::{join_all, Runtime};
/// use core_types::Value;
///
/// let runtime = Runtime::new();
/// let (slow, resolve_slow) = runtime.pending();
/// let all = join_all(&runtime, vec![Value::Smi(1), slow.into(), Value::Smi(3)]);
///
/// resolve_slow.resolve(2);
/// runtime.drain();
/// assert_eq!(
///     all.value(),
///     Some(Value::Array(vec![Value::Smi(1), Value::Smi(2), Value::Smi(3)]))
/// );
/// ```
pub fn join_all<I>(runtime: &Runtime, inputs: I) -> Future
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let sources = to_futures(runtime, inputs);
    let (result, resolver) = runtime.pending();
    if sources.is_empty() {
        resolver.resolve(Value::Array(Vec::new()));
        return result;
    }

    let tracker = Rc::new(RefCell::new(JoinAllTracker::new(sources.len())));
    for (index, source) in sources.iter().enumerate() {
        let on_fulfilled = {
            let tracker = Rc::clone(&tracker);
            let resolver = resolver.clone();
            move |value| {
                let complete = tracker.borrow_mut().record_fulfillment(index, value);
                if complete {
                    let values = tracker.borrow().collect_values();
                    resolver.resolve(Value::Array(values));
                }
            }
        };
        let on_rejected = {
            let tracker = Rc::clone(&tracker);
            let resolver = resolver.clone();
            move |reason| {
                tracker.borrow_mut().mark_settled();
                resolver.reject(reason);
            }
        };
        source.subscribe(on_fulfilled, on_rejected);
    }
    result
}

/// Fulfills once every input has settled, with one outcome descriptor per
/// input in input order. Never rejects.
///
/// # Examples
///
/// ```
/// use eventual::{settle_all, Runtime};
/// use core_types::{Outcome, Value};
///
/// let runtime = Runtime::new();
/// let settled = settle_all(&runtime, vec![runtime.resolved(1), runtime.rejected("e")]);
/// runtime.drain();
///
/// assert_eq!(
///     settled.value(),
///     Some(Value::Array(vec![
///         Outcome::Fulfilled(Value::Smi(1)).into(),
///         Outcome::Rejected(Value::from("e")).into(),
///     ]))
/// );
/// ```
pub fn settle_all<I>(runtime: &Runtime, inputs: I) -> Future
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let sources = to_futures(runtime, inputs);
    let (result, resolver) = runtime.pending();
    if sources.is_empty() {
        resolver.resolve(Value::Array(Vec::new()));
        return result;
    }

    let tracker = Rc::new(RefCell::new(SettleAllTracker::new(sources.len())));
    for (index, source) in sources.iter().enumerate() {
        let record = {
            let tracker = Rc::clone(&tracker);
            let resolver = resolver.clone();
            move |outcome: Outcome| {
                let complete = tracker.borrow_mut().record(index, outcome);
                if complete {
                    let outcomes = tracker.borrow().collect_outcomes();
                    resolver.resolve(Value::Array(outcomes));
                }
            }
        };
        let record_rejection = record.clone();
        source.subscribe(
            move |value| record(Outcome::Fulfilled(value)),
            move |reason| record_rejection(Outcome::Rejected(reason)),
        );
    }
    result
}

/// Settles like whichever input settles first in time.
///
/// Later settlements are ignored. An empty input never settles.
///
/// # Examples
///
/// ```
/// use eventual::{race, Runtime};
/// use core_types::Value;
///
/// let runtime = Runtime::new();
/// let (slow, _resolve_slow) = runtime.pending();
/// let (fast, resolve_fast) = runtime.pending();
/// let winner = race(&runtime, vec![slow, fast]);
///
/// resolve_fast.resolve("fast");
/// runtime.drain();
/// assert_eq!(winner.value(), Some(Value::from("fast")));
/// ```
pub fn race<I>(runtime: &Runtime, inputs: I) -> Future
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let sources = to_futures(runtime, inputs);
    let (result, resolver) = runtime.pending();
    for source in &sources {
        let on_fulfilled = {
            let resolver = resolver.clone();
            move |value| resolver.resolve(value)
        };
        let on_rejected = {
            let resolver = resolver.clone();
            move |reason| resolver.reject(reason)
        };
        source.subscribe(on_fulfilled, on_rejected);
    }
    result
}

/// Fulfills with the value of the first input to fulfill.
///
/// Rejects only once every input has rejected, with
/// [`FutureError::Aggregate`] holding all reasons in input order. An empty
/// input rejects immediately with an empty aggregate.
///
/// # Examples
///
/// ```
/// use eventual::{first_success, Runtime};
/// use core_types::Value;
///
/// let runtime = Runtime::new();
/// let any = first_success(
///     &runtime,
///     vec![runtime.rejected("a"), runtime.rejected("b"), runtime.resolved(5)],
/// );
/// runtime.drain();
/// assert_eq!(any.value(), Some(Value::Smi(5)));
/// ```
pub fn first_success<I>(runtime: &Runtime, inputs: I) -> Future
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let sources = to_futures(runtime, inputs);
    let (result, resolver) = runtime.pending();
    if sources.is_empty() {
        resolver.reject(FutureError::Aggregate(Vec::new()));
        return result;
    }

    let tracker = Rc::new(RefCell::new(FirstSuccessTracker::new(sources.len())));
    for (index, source) in sources.iter().enumerate() {
        let on_fulfilled = {
            let tracker = Rc::clone(&tracker);
            let resolver = resolver.clone();
            move |value| {
                tracker.borrow_mut().mark_settled();
                resolver.resolve(value);
            }
        };
        let on_rejected = {
            let tracker = Rc::clone(&tracker);
            let resolver = resolver.clone();
            move |reason| {
                let exhausted = tracker.borrow_mut().record_rejection(index, reason);
                if exhausted {
                    let reasons = tracker.borrow().collect_reasons();
                    resolver.reject(FutureError::Aggregate(reasons));
                }
            }
        };
        source.subscribe(on_fulfilled, on_rejected);
    }
    result
}
