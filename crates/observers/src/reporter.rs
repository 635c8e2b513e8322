//! Console and file output of a duct flow run.

mod error;

pub use error::ReportError;

use std::path::Path;

use tracing::{debug, info, info_span, warn};
use uom::si::{time::second, velocity::meter_per_second};
use venturi_core::{
    Axis, Lattice, LatticeStatistics, Observer, Plane, RuntimeContext, units::UnitConverter,
};
use venturi_solvers::transient::Event;

use crate::{
    heatmap::Heatmap,
    timer::Timer,
    traits::CanStopEarly,
    writer::{self, FileNames},
};

/// Lattice statistics recorded at one reporting step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub step: usize,

    /// Physical time in seconds.
    pub time: f64,

    pub statistics: LatticeStatistics,
}

/// Observer writing the results of a run.
///
/// - At `iT = 0` every worker writes the geometry, cuboid and rank of its
///   voxels, and the main worker writes the index of those files.
/// - Every [`cadence`](Reporter::cadence) steps every worker writes its
///   physical velocity and pressure, the main worker renders the heatmaps of
///   the mid z-plane and logs timing and lattice statistics.
/// - When the run finishes the main worker logs the timer summary.
///
/// Statistics and the plane are collective, so every worker must observe the
/// same events. A failed write stops the run early; the error is returned by
/// [`Reporter::finish`].
#[derive(Debug)]
pub struct Reporter<'r> {
    context: &'r RuntimeContext,
    converter: &'r UnitConverter,
    names: FileNames,
    cadence: usize,
    heatmaps: Vec<Heatmap>,
    timer: Timer,
    history: Vec<Record>,
    error: Option<ReportError>,
}

impl<'r> Reporter<'r> {
    /// Creates a reporter for a run of `total_steps` steps that reports once
    /// per simulated second.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        context: &'r RuntimeContext,
        converter: &'r UnitConverter,
        total_steps: usize,
    ) -> Self {
        Self {
            context,
            converter,
            names: FileNames::new(name),
            cadence: converter.lattice_time_seconds(1.0).max(1),
            heatmaps: Vec::new(),
            timer: Timer::new(total_steps, 0),
            history: Vec::new(),
            error: None,
        }
    }

    /// Reports every `cadence` steps instead; zero is treated as one.
    #[must_use]
    pub fn with_cadence(mut self, cadence: usize) -> Self {
        self.cadence = cadence.max(1);
        self
    }

    #[must_use]
    pub fn with_heatmap(mut self, heatmap: Heatmap) -> Self {
        self.heatmaps.push(heatmap);
        self
    }

    #[must_use]
    pub fn with_heatmaps(mut self, heatmaps: impl IntoIterator<Item = Heatmap>) -> Self {
        self.heatmaps.extend(heatmaps);
        self
    }

    #[must_use]
    pub fn cadence(&self) -> usize {
        self.cadence
    }

    #[must_use]
    pub fn is_due(&self, step: usize) -> bool {
        step % self.cadence == 0
    }

    #[must_use]
    pub fn history(&self) -> &[Record] {
        &self.history
    }

    /// Ends reporting and returns the recorded statistics.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the run, if any.
    pub fn finish(self) -> Result<Vec<Record>, ReportError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.history),
        }
    }

    fn report<L: Lattice>(&mut self, event: &Event<'_, L>) -> Result<(), ReportError> {
        match *event {
            Event::Initialized { lattice } => self.initialized(lattice),
            Event::Stepped {
                step,
                scaling,
                lattice,
            } => {
                if let Some(factor) = scaling {
                    if self.context.is_main() {
                        info!("step={step}; scaling factor={factor:.6}");
                    }
                }
                if self.is_due(step) {
                    self.results(step, lattice)
                } else {
                    Ok(())
                }
            }
            Event::Finished { steps, .. } => {
                if let Some(summary) = self.timer.stop(steps) {
                    if self.context.is_main() {
                        summary.log();
                    }
                }
                Ok(())
            }
        }
    }

    fn initialized<L: Lattice>(&mut self, lattice: &L) -> Result<(), ReportError> {
        let rank = self.context.rank();
        let _span = info_span!("get_results", rank, step = 0).entered();

        let statistics = lattice.statistics().map_err(ReportError::lattice)?;
        self.timer = Timer::new(self.timer.total_steps(), statistics.cells);

        let path = writer::geometry_path(self.context, &self.names);
        writer::write_geometry(&path, &lattice.samples(), rank)
            .map_err(|source| ReportError::io(&path, source))?;
        if self.context.is_main() {
            let path = self.context.output_path(&self.names.index());
            writer::write_index(&path, &self.names, self.context.workers())
                .map_err(|source| ReportError::io(&path, source))?;
        }
        debug!(cells = statistics.cells, "wrote geometry");

        self.timer.start();
        Ok(())
    }

    fn results<L: Lattice>(&mut self, step: usize, lattice: &L) -> Result<(), ReportError> {
        let _span = info_span!("get_results", rank = self.context.rank(), step).entered();

        let statistics = lattice.statistics().map_err(ReportError::lattice)?;
        let plane = lattice.plane(Axis::Z).map_err(ReportError::lattice)?;

        let path = writer::fields_path(self.context, &self.names, step);
        writer::write_fields(&path, &lattice.samples(), self.converter)
            .map_err(|source| ReportError::io(&path, source))?;

        if let Some(plane) = plane {
            let plane = self.physical(plane);
            self.render(&plane, step, self.context.output_dir())?;
        }

        let time = self.converter.phys_time(step).get::<second>();
        let report = self.timer.update(step);
        if self.context.is_main() {
            report.log();
            info!(
                "step={step}; t={time:.3}s; uMax={:.6}; avEnergy={:.6e}; avRho={:.6}",
                statistics.max_velocity, statistics.average_energy, statistics.average_density,
            );
        }

        self.history.push(Record {
            step,
            time,
            statistics,
        });
        Ok(())
    }

    /// Converts lattice velocities on `plane` to m/s.
    fn physical(&self, plane: Plane) -> Plane {
        Plane {
            values: plane
                .values
                .into_iter()
                .map(|value| {
                    value.map(|u| self.converter.phys_velocity(u).get::<meter_per_second>())
                })
                .collect(),
            ..plane
        }
    }

    fn render(&self, plane: &Plane, step: usize, dir: &Path) -> Result<(), ReportError> {
        for heatmap in &self.heatmaps {
            match heatmap.write(plane, step, dir) {
                Ok(Some(path)) => debug!(path = %path.display(), "wrote heatmap"),
                Ok(None) => warn!(name = heatmap.name(), "nothing to render"),
                Err(source) => {
                    return Err(ReportError::Image {
                        path: dir.join(heatmap.file_name(step)),
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<'a, L, A> Observer<Event<'a, L>, A> for Reporter<'_>
where
    L: Lattice,
    A: CanStopEarly,
{
    fn observe(&mut self, event: &Event<'a, L>) -> Option<A> {
        if self.error.is_some() {
            return Some(A::stop_early());
        }
        match self.report(event) {
            Ok(()) => None,
            Err(error) => {
                warn!(rank = self.context.rank(), %error, "stopping the run");
                self.error = Some(error);
                Some(A::stop_early())
            }
        }
    }
}

impl<'a, L, A> Observer<Event<'a, L>, A> for &mut Reporter<'_>
where
    L: Lattice,
    A: CanStopEarly,
{
    fn observe(&mut self, event: &Event<'a, L>) -> Option<A> {
        (**self).observe(event)
    }
}

#[cfg(test)]
mod tests;
