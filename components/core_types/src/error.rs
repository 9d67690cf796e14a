//! Rejection reasons produced by the library itself.
//!
//! User code may reject a future with any [`Value`]. The variants here are
//! the reasons the library generates when a fault is detected during its
//! own bookkeeping, wrapped as [`Value::Error`] before they are used.

use crate::{FutureId, Value};
use thiserror::Error;

/// A library-produced rejection reason.
///
/// # Examples
///
/// ```
/// use core_types::{FutureError, FutureId, Value};
///
/// let err = FutureError::Cycle(FutureId::new(3));
/// assert_eq!(err.to_string(), "chaining cycle detected for future #3");
///
/// let aggregate = FutureError::Aggregate(vec![Value::from("a"), Value::from("b")]);
/// assert_eq!(aggregate.reasons(), &[Value::from("a"), Value::from("b")]);
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FutureError {
    /// A future was resolved with itself, directly or through a chain of
    /// adopted futures.
    #[error("chaining cycle detected for future {0}")]
    Cycle(FutureId),

    /// Every input of a first-success combination rejected. Reasons are in
    /// input order.
    #[error("all {} futures were rejected", .0.len())]
    Aggregate(Vec<Value>),
}

impl FutureError {
    /// The aggregated rejection reasons, empty for non-aggregate errors.
    pub fn reasons(&self) -> &[Value] {
        match self {
            FutureError::Aggregate(reasons) => reasons,
            FutureError::Cycle(_) => &[],
        }
    }

    /// Returns true for a cycle-detection error.
    pub fn is_cycle(&self) -> bool {
        matches!(self, FutureError::Cycle(_))
    }
}
