use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, info_span};
use venturi_core::{
    CommError, Communicator, Material, RuntimeContext, launch,
    units::{UnitConverter, UnitError},
};
use venturi_geometry::{
    ConfigurationError, GeometryError, GeometryStatistics, SuperGeometry,
    classify::{Classification, classify, duct_rules},
    partition,
};
use venturi_observers::{Record, ReportError, Reporter, heatmap::duct_heatmaps};
use venturi_solvers::{
    PoiseuilleProfile, RelaxationLattice,
    transient::{self, Solution},
};

use crate::config::Config;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Units(#[from] UnitError),

    #[error("the inflow opening has no fluid to define its profile")]
    NoInflow,

    #[error(transparent)]
    Solver(#[from] transient::Error),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Comm(#[from] CommError),

    #[error("failed to prepare output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RunError {
    fn output(path: &Path, source: io::Error) -> Self {
        Self::Output {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The classified geometry of one worker.
#[derive(Debug)]
pub struct PreparedGeometry {
    pub geometry: SuperGeometry,
    pub classification: Classification,
    pub statistics: GeometryStatistics,
}

/// What `check` learned about the geometry, as seen by the main worker.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub cuboids: usize,

    /// Summed cuboid weight per worker.
    pub loads: Vec<u64>,

    pub classification: Classification,
    pub statistics: GeometryStatistics,
}

/// Outcome of a full run, as seen by the main worker.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub solution: Solution,
    pub records: Vec<Record>,
}

/// Discretizes, partitions and classifies the duct of `config`.
///
/// This is a collective operation.
///
/// # Errors
///
/// Returns an error if the duct cannot be partitioned for the workers of
/// `context` or the classified geometry is inconsistent.
pub fn prepare_geometry(
    config: &Config,
    context: &RuntimeContext,
    comm: &Communicator,
) -> Result<PreparedGeometry, RunError> {
    let _span = info_span!("prepare_geometry", rank = context.rank()).entered();
    if context.is_main() {
        info!("prepare geometry ...");
    }

    let indicators = config.geometry.indicators();
    let balancer = config.balancer();
    let settings = config.partition_settings(context.workers());
    let partition = partition(&*indicators.venturi, &settings, &*balancer)?;
    let mut geometry = SuperGeometry::new(partition, context.clone(), config.parallel.overlap)?;

    let rules = duct_rules(
        &*indicators.venturi,
        &indicators.inflow,
        &indicators.outflow0,
        &indicators.outflow1,
    );
    let classification = classify(&mut geometry, &rules, comm)?;
    let statistics = GeometryStatistics::collect(&geometry, comm)?;

    if context.is_main() {
        statistics.log();
        info!("prepare geometry ... ok");
    }
    Ok(PreparedGeometry {
        geometry,
        classification,
        statistics,
    })
}

/// Prepares and validates the geometry on `workers` workers.
///
/// # Errors
///
/// Returns the first error of any worker.
pub fn check(config: &Config, workers: usize) -> Result<CheckReport, RunError> {
    let output_dir = config.application.output_dir.as_path();
    let reports = launch(workers, |comm| {
        let context = RuntimeContext::for_worker(comm, output_dir);
        let prepared = prepare_geometry(config, &context, comm)?;
        let partition = prepared.geometry.partition();
        Ok::<_, RunError>(CheckReport {
            cuboids: partition.cuboids().len(),
            loads: partition.assignment().loads(partition.cuboids()),
            classification: prepared.classification,
            statistics: prepared.statistics,
        })
    })?;
    reports.into_iter().next().ok_or(RunError::Comm(CommError::NoWorkers))
}

/// Runs the whole simulation on `workers` workers, writing to `output_dir`.
///
/// # Errors
///
/// Returns the first error of any worker. Nothing is retried.
pub fn run(config: &Config, workers: usize, output_dir: &Path) -> Result<RunReport, RunError> {
    fs::create_dir_all(output_dir).map_err(|source| RunError::output(output_dir, source))?;

    let converter = config.converter()?;
    converter.log();
    let parameters = output_dir.join(format!("{}.dat", config.application.name));
    converter
        .write(&parameters)
        .map_err(|source| RunError::output(&parameters, source))?;

    let max_steps = config.max_steps(&converter);
    info!(workers, max_steps, "starting run");

    let reports = launch(workers, |comm| {
        run_worker(config, &converter, output_dir, max_steps, comm)
    })?;
    reports.into_iter().next().ok_or(RunError::Comm(CommError::NoWorkers))
}

fn run_worker(
    config: &Config,
    converter: &UnitConverter,
    output_dir: &Path,
    max_steps: usize,
    comm: &Communicator,
) -> Result<RunReport, RunError> {
    let context = RuntimeContext::for_worker(comm, output_dir);
    let _span = info_span!("worker", rank = context.rank()).entered();

    let prepared = prepare_geometry(config, &context, comm)?;
    let inflow = prepared
        .statistics
        .material(Material::INFLOW)
        .and_then(|opening| {
            PoiseuilleProfile::from_statistics(opening, converter.char_lattice_velocity())
        })
        .ok_or(RunError::NoInflow)?;

    let mut lattice = RelaxationLattice::new(&prepared.geometry, comm, converter.omega());
    transient::prepare(&mut lattice)?;
    if context.is_main() {
        info!("prepare lattice ... ok");
    }

    let name = config.application.name.as_str();
    let scheduler = config.scheduler(converter);
    let mut reporter = Reporter::new(name, &context, converter, max_steps + 1)
        .with_heatmaps(duct_heatmaps(name));

    let solution = transient::run(&mut lattice, &scheduler, &inflow, max_steps, &mut reporter)?;
    let records = reporter.finish()?;

    Ok(RunReport { solution, records })
}
