//! Integration test suite for the eventual-value runtime
//!
//! This crate verifies that futures, combinators, rejection tracking and
//! the event loop work together across component boundaries.

/// Re-export components for test convenience
pub mod components {
    pub use core_types;
    pub use eventual;
}
