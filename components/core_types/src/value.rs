//! Dynamic value representation carried by futures.
//!
//! A future's outcome may be any value, and so may its rejection reason.
//! This module provides the `Value` enum that models those values, along
//! with the settle-all `Outcome` descriptor.

use crate::{FutureError, Thenable};
use std::fmt;
use std::rc::Rc;

/// Represents any value a future can be fulfilled or rejected with.
///
/// Primitive values are stored inline. Thenables and library-produced
/// errors are reference counted and compare by identity.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let number = Value::from(42);
/// let reason = Value::from("boom");
///
/// assert_eq!(number, Value::Smi(42));
/// assert_eq!(reason.to_string(), "boom");
/// assert!(number.as_thenable().is_none());
/// ```
#[derive(Clone)]
pub enum Value {
    /// The absent value
    Undefined,
    /// The explicit null value
    Null,
    /// Boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// IEEE 754 double-precision floating point
    Double(f64),
    /// String value
    String(std::string::String),
    /// Ordered sequence of values (join-all results, aggregates)
    Array(Vec<Value>),
    /// Settle-all outcome descriptor
    Outcome(Box<Outcome>),
    /// Rejection reason produced by the library itself
    Error(Rc<FutureError>),
    /// A value exposing the continuation-attach capability
    Thenable(Rc<dyn Thenable>),
}

/// The settled outcome of a single future, as reported by settle-all.
///
/// # Examples
///
/// ```
/// use core_types::{Outcome, Value};
///
/// let outcome = Outcome::Fulfilled(Value::Smi(1));
/// assert_eq!(outcome.status(), "fulfilled");
/// assert_eq!(outcome.value(), Some(&Value::Smi(1)));
/// assert!(outcome.reason().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `{status: "fulfilled", value}`
    Fulfilled(Value),
    /// `{status: "rejected", reason}`
    Rejected(Value),
}

impl Outcome {
    /// Returns `"fulfilled"` or `"rejected"`.
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Fulfilled(_) => "fulfilled",
            Outcome::Rejected(_) => "rejected",
        }
    }

    /// The fulfillment value, if this outcome is fulfilled.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Fulfilled(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    /// The rejection reason, if this outcome is rejected.
    pub fn reason(&self) -> Option<&Value> {
        match self {
            Outcome::Fulfilled(_) => None,
            Outcome::Rejected(reason) => Some(reason),
        }
    }

    /// Returns true if this outcome is fulfilled.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Fulfilled(value) => write!(f, "{{status: fulfilled, value: {}}}", value),
            Outcome::Rejected(reason) => write!(f, "{{status: rejected, reason: {}}}", reason),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::Double(n) => f.debug_tuple("Double").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Outcome(outcome) => f.debug_tuple("Outcome").field(outcome).finish(),
            Value::Error(err) => f.debug_tuple("Error").field(err).finish(),
            Value::Thenable(thenable) => match thenable.future_id() {
                Some(id) => write!(f, "Thenable({})", id),
                None => write!(f, "Thenable(...)"),
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Outcome(a), Value::Outcome(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            (Value::Thenable(a), Value::Thenable(b)) => match (a.future_id(), b.future_id()) {
                (Some(x), Some(y)) => x == y,
                _ => Rc::ptr_eq(a, b),
            },
            _ => false,
        }
    }
}

impl Value {
    /// Wraps a library error as a rejection reason.
    pub fn error(err: FutureError) -> Self {
        Value::Error(Rc::new(err))
    }

    /// Returns the continuation-attach capability if this value has one.
    pub fn as_thenable(&self) -> Option<&Rc<dyn Thenable>> {
        match self {
            Value::Thenable(thenable) => Some(thenable),
            _ => None,
        }
    }

    /// Returns the elements if this value is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the library error if this value is one.
    pub fn as_error(&self) -> Option<&FutureError> {
        match self {
            Value::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the settle-all descriptor if this value is one.
    pub fn as_outcome(&self) -> Option<&Outcome> {
        match self {
            Value::Outcome(outcome) => Some(outcome),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<std::string::String> for Value {
    fn from(s: std::string::String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Outcome> for Value {
    fn from(outcome: Outcome) -> Self {
        Value::Outcome(Box::new(outcome))
    }
}

impl From<FutureError> for Value {
    fn from(err: FutureError) -> Self {
        Value::error(err)
    }
}

/// String conversion.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::Boolean(true).to_string(), "true");
/// assert_eq!(Value::Smi(42).to_string(), "42");
/// assert_eq!(Value::Array(vec![Value::Smi(1), Value::Smi(2)]).to_string(), "1,2");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Smi(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
            Value::Outcome(outcome) => write!(f, "{}", outcome),
            Value::Error(err) => write!(f, "{}", err),
            Value::Thenable(thenable) => match thenable.future_id() {
                Some(id) => write!(f, "[future {}]", id),
                None => write!(f, "[thenable]"),
            },
        }
    }
}
