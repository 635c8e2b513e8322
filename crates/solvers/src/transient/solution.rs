/// Indicates how the step loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Completed all requested steps.
    Complete,

    /// Stopped early by observer request.
    StoppedByObserver,
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub status: Status,

    /// Number of lattice advances performed.
    pub steps: usize,
}
