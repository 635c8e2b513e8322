/// Events emitted by the step loop.
///
/// Every event borrows the lattice so observers can read its state, which
/// includes running collective reductions on it.
#[derive(Debug)]
pub enum Event<'a, L> {
    /// The lattice is prepared and no step has run yet.
    Initialized { lattice: &'a L },

    /// Step `step` has advanced the lattice.
    Stepped {
        step: usize,

        /// The ramp factor pushed to the inflow before this step, if any.
        scaling: Option<f64>,

        lattice: &'a L,
    },

    /// The loop has ended after `steps` advances.
    Finished { steps: usize, lattice: &'a L },
}

impl<'a, L> Event<'a, L> {
    /// The lattice the event refers to.
    #[must_use]
    pub fn lattice(&self) -> &'a L {
        match *self {
            Self::Initialized { lattice }
            | Self::Stepped { lattice, .. }
            | Self::Finished { lattice, .. } => lattice,
        }
    }

    /// The step just completed, or `None` outside the loop.
    #[must_use]
    pub fn step(&self) -> Option<usize> {
        match *self {
            Self::Stepped { step, .. } => Some(step),
            Self::Initialized { .. } | Self::Finished { .. } => None,
        }
    }
}
