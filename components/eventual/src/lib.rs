//! Eventual-value primitives: futures, continuations and combinators.
//!
//! This crate provides single-threaded, cooperatively scheduled futures:
//! - Continuation queue deferring every reaction to a later drain
//! - Future state machine with resolve/reject/adopt and chained handlers
//! - Combinators: join-all, settle-all, race, first-success
//! - Unhandled-rejection tracking with subscribe/unsubscribe signals
//! - An event loop with macrotasks and virtual-clock timers
//!
//! # Overview
//!
//! - [`Runtime`] - Creates futures and owns the queue they schedule on
//! - [`Future`] - An eventual value with [`attach`](Future::attach), `then`, `catch`, `finally`
//! - [`ContinuationQueue`] - FIFO of deferred jobs, drained by the host
//! - [`RejectionTracker`] - Reports rejections nobody handled
//! - [`EventLoop`] - Tasks, timers and continuation drains
//!
//! # Examples
//!
//! ## Chaining
//!
//! ```
//! use eventual::Runtime;
//! use core_types::Value;
//!
//! let runtime = Runtime::new();
//! let (future, resolver) = runtime.pending();
//! let message = future
//!     .then(|v| Ok(Value::from(format!("got {}", v))))
//!     .catch(|reason| Ok(reason));
//!
//! resolver.resolve(7);
//! runtime.drain();
//! assert_eq!(message.value(), Some(Value::from("got 7")));
//! ```
//!
//! ## Combinators
//!
//! ```
//! use eventual::{first_success, Runtime};
//! use core_types::Value;
//!
//! let runtime = Runtime::new();
//! let any = first_success(&runtime, vec![runtime.rejected("a"), runtime.rejected("b")]);
//! runtime.drain();
//!
//! let reason = any.reason().unwrap();
//! assert_eq!(reason.as_error().unwrap().reasons(), &[Value::from("a"), Value::from("b")]);
//! ```
//!
//! ## Event Loop Usage
//!
//! ```
//! use eventual::{EventLoop, Task};
//!
//! let mut event_loop = EventLoop::new();
//! event_loop.enqueue_task(Task::new(|| Ok(())));
//! event_loop.run_until_done().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod combinators;
pub mod config;
pub mod error;
pub mod event_loop;
pub mod future;
pub mod rejection;
pub mod runtime;
pub mod task_queue;

// Re-export main types at crate root
pub use combinators::{
    first_success, join_all, race, settle_all, FirstSuccessTracker, JoinAllTracker,
    SettleAllTracker,
};
pub use config::{RuntimeConfig, DEFAULT_REJECTION_GRACE_PASSES};
pub use error::{ConfigError, RuntimeError, RuntimeResult};
pub use event_loop::{EventLoop, Task, TaskQueue, TimerHandle, TimerId};
pub use future::{Future, FutureState, Handler, Resolver};
pub use rejection::{RejectionState, RejectionTracker, Subscription};
pub use runtime::Runtime;
pub use task_queue::{ContinuationQueue, DrainStats, Job};
