//! Capability traits for run observers.
//!
//! These traits abstract over the action type of a driver so an observer can
//! be reused with any loop that understands the capability.
//!
//! # Example
//!
//! ```rust
//! use venturi_core::Observer;
//! use venturi_observers::traits::CanStopEarly;
//!
//! struct StepLimit {
//!     limit: usize,
//!     seen: usize,
//! }
//!
//! impl<E, A: CanStopEarly> Observer<E, A> for StepLimit {
//!     fn observe(&mut self, _event: &E) -> Option<A> {
//!         self.seen += 1;
//!         (self.seen > self.limit).then(A::stop_early)
//!     }
//! }
//! ```

use venturi_solvers::transient;

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the driver early.
    fn stop_early() -> Self;
}

impl CanStopEarly for transient::Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}
