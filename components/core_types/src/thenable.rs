//! The continuation-attach capability.
//!
//! Resolving a future with a value that implements [`Thenable`] makes the
//! future adopt that value's eventual outcome instead of fulfilling with it.

use crate::Value;
use std::any::Any;
use std::fmt;

/// A one-shot callback receiving a fulfillment value or rejection reason.
pub type Continuation = Box<dyn FnOnce(Value)>;

/// Identity of a future, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FutureId(u64);

impl FutureId {
    /// Creates an identity from a raw counter value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw counter value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FutureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A value that can deliver an eventual outcome to continuations.
///
/// Exactly one of the two continuations should eventually be called. Calls
/// after the first are ignored by the adopting future. Returning `Err`
/// signals that attaching itself failed; the adopting future rejects with
/// the returned value unless a continuation already ran.
///
/// # Examples
///
/// ```
/// use core_types::{Continuation, Thenable, Value};
/// use std::any::Any;
///
/// struct Ready(i32);
///
/// impl Thenable for Ready {
///     fn attach_continuations(
///         &self,
///         on_fulfilled: Continuation,
///         _on_rejected: Continuation,
///     ) -> Result<(), Value> {
///         on_fulfilled(Value::Smi(self.0));
///         Ok(())
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
/// }
///
/// let ready = Ready(7);
/// assert!(ready.future_id().is_none());
/// ```
pub trait Thenable {
    /// Registers the continuations for this value's outcome.
    fn attach_continuations(
        &self,
        on_fulfilled: Continuation,
        on_rejected: Continuation,
    ) -> Result<(), Value>;

    /// The identity of this thenable when it is a library future.
    fn future_id(&self) -> Option<FutureId> {
        None
    }

    /// Access to the concrete type for downcasting.
    fn as_any(&self) -> &dyn Any;
}
