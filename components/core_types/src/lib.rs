//! Core value types shared by the eventual-value runtime.
//!
//! This crate provides the foundational types that futures carry and
//! exchange, independent of how futures are scheduled.
//!
//! # Overview
//!
//! - [`Value`] - Any fulfillment value or rejection reason
//! - [`Outcome`] - Settle-all descriptor (`fulfilled` / `rejected`)
//! - [`Thenable`] - The continuation-attach capability used for adoption
//! - [`FutureId`] - Identity of a future
//! - [`FutureError`] - Rejection reasons produced by the library itself
//!
//! # Examples
//!
//! ```
//! use core_types::{FutureError, FutureId, Outcome, Value};
//!
//! let values = Value::from(vec![Value::Smi(1), Value::from("two")]);
//! assert_eq!(values.to_string(), "1,two");
//!
//! let settled = Value::from(Outcome::Rejected(Value::from("boom")));
//! assert_eq!(settled.as_outcome().map(Outcome::status), Some("rejected"));
//!
//! let reason = Value::from(FutureError::Cycle(FutureId::new(1)));
//! assert!(reason.as_error().is_some_and(FutureError::is_cycle));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod thenable;
mod value;

pub use error::FutureError;
pub use thenable::{Continuation, FutureId, Thenable};
pub use value::{Outcome, Value};
