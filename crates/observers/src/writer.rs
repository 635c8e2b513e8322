//! CSV output of the distributed geometry and flow fields.
//!
//! Every worker writes its own files; the main worker also writes an index
//! that lists the per-worker files of a data set.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use uom::si::{pressure::pascal, velocity::meter_per_second};
use venturi_core::{CellSample, RuntimeContext, units::UnitConverter};

/// Names of the files written for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNames {
    name: String,
}

impl FileNames {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Geometry, cuboid and rank of every voxel owned by `rank`.
    #[must_use]
    pub fn geometry(&self, rank: usize) -> String {
        format!("{}_geometry_r{rank}.csv", self.name)
    }

    /// Physical velocity and pressure owned by `rank` at `step`.
    #[must_use]
    pub fn fields(&self, step: usize, rank: usize) -> String {
        format!("{}_iT{step:07}_r{rank}.csv", self.name)
    }

    /// Index of all per-worker geometry files.
    #[must_use]
    pub fn index(&self) -> String {
        format!("{}_index.csv", self.name)
    }
}

/// Writes `rows` below a header line; every row must match the header width.
fn write_rows<P, I>(path: P, headers: &[&str], rows: I) -> io::Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = Vec<String>>,
{
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "{}", headers.join(","))?;
    for row in rows {
        if row.len() != headers.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "row has {} columns, header has {}",
                    row.len(),
                    headers.len()
                ),
            ));
        }
        writeln!(file, "{}", row.join(","))?;
    }
    file.flush()
}

/// Writes the position, material, cuboid and rank of every sample.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_geometry(path: &Path, samples: &[CellSample], rank: usize) -> io::Result<()> {
    write_rows(
        path,
        &["x", "y", "z", "material", "cuboid", "rank"],
        samples.iter().map(|sample| {
            vec![
                format!("{:.6e}", sample.position.x),
                format!("{:.6e}", sample.position.y),
                format!("{:.6e}", sample.position.z),
                sample.material.to_string(),
                sample.cuboid.to_string(),
                rank.to_string(),
            ]
        }),
    )
}

/// Writes the physical velocity and pressure of every sample.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_fields(path: &Path, samples: &[CellSample], converter: &UnitConverter) -> io::Result<()> {
    write_rows(
        path,
        &["x", "y", "z", "ux", "uy", "uz", "velocity", "pressure"],
        samples.iter().map(|sample| {
            let physical = |value: f64| converter.phys_velocity(value).get::<meter_per_second>();
            let velocity = sample.velocity;
            vec![
                format!("{:.6e}", sample.position.x),
                format!("{:.6e}", sample.position.y),
                format!("{:.6e}", sample.position.z),
                format!("{:.6e}", physical(velocity.x)),
                format!("{:.6e}", physical(velocity.y)),
                format!("{:.6e}", physical(velocity.z)),
                format!("{:.6e}", physical(velocity.length())),
                format!(
                    "{:.6e}",
                    converter.phys_pressure(sample.density).get::<pascal>()
                ),
            ]
        }),
    )
}

/// Writes the index listing the geometry file of every worker.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_index(path: &Path, names: &FileNames, workers: usize) -> io::Result<()> {
    write_rows(
        path,
        &["rank", "file"],
        (0..workers).map(|rank| vec![rank.to_string(), names.geometry(rank)]),
    )
}

/// The geometry file of the worker running in `context`.
#[must_use]
pub fn geometry_path(context: &RuntimeContext, names: &FileNames) -> PathBuf {
    context.output_path(&names.geometry(context.rank()))
}

/// The field file of the worker running in `context` at `step`.
#[must_use]
pub fn fields_path(context: &RuntimeContext, names: &FileNames, step: usize) -> PathBuf {
    context.output_path(&names.fields(step, context.rank()))
}
