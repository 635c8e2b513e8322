//! TOML configuration of a duct run.
//!
//! The file is read once at startup and validated before any partitioning.
//! Fields with a default may be omitted; every other missing or malformed
//! field is an error.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use glam::DVec3;
use serde::Deserialize;
use thiserror::Error;
use uom::si::f64::Time;
use uom::si::time::second;
use venturi_core::units::{PhysicalParameters, UnitConverter, UnitError};
use venturi_geometry::{
    BlockBalance, HeuristicBalance, Indicator, LoadBalancingStrategy, PartitionSettings,
    indicator::{AxisAlignedBox, Cone, Cylinder, Sphere, Union},
};
use venturi_solvers::{
    PolynomialStartScale, RampScheduler, SinusStartScale, StartScale,
    ramp::{self, BOUNDARY_PERIOD, RAMP_FRACTION},
};

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl Error {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub application: Application,

    #[serde(default)]
    pub parallel: Parallel,

    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Application {
    pub name: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Simulated duration in seconds.
    pub max_phys_time: f64,

    /// Fraction of the run spent ramping up the inflow.
    #[serde(default = "default_ramp_fraction")]
    pub ramp_fraction: f64,

    /// Steps between two inflow refreshes during the ramp.
    #[serde(default = "default_boundary_period")]
    pub boundary_period: usize,

    #[serde(default)]
    pub start_scale: StartScaleKind,

    pub discretization: Discretization,
    pub physical: Physical,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Discretization {
    /// Voxels per characteristic length.
    pub resolution: usize,
    pub lattice_relaxation_time: f64,
}

/// Characteristic physical parameters in SI units.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Physical {
    pub char_length: f64,
    pub char_velocity: f64,
    pub viscosity: f64,
    pub density: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartScaleKind {
    #[default]
    Polynomial,
    Sinus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalancerKind {
    #[default]
    Block,
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parallel {
    pub workers: usize,
    pub cuboids_per_worker: usize,
    pub balancer: BalancerKind,

    /// Width of the ghost layer around every cuboid.
    pub overlap: usize,
}

impl Default for Parallel {
    fn default() -> Self {
        Self {
            workers: 1,
            cuboids_per_worker: 1,
            balancer: BalancerKind::Block,
            overlap: 1,
        }
    }
}

/// The duct and its openings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Geometry {
    pub inflow: CylinderSpec,
    pub outflow0: CylinderSpec,
    pub outflow1: CylinderSpec,
    pub venturi: Shape,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CylinderSpec {
    pub center1: [f64; 3],
    pub center2: [f64; 3],
    pub radius: f64,
}

/// A shape tree built from primitive solids.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum Shape {
    Cylinder {
        center1: [f64; 3],
        center2: [f64; 3],
        radius: f64,
    },
    Cone {
        center1: [f64; 3],
        center2: [f64; 3],
        radius1: f64,
        radius2: f64,
    },
    Cuboid {
        origin: [f64; 3],
        extent: [f64; 3],
    },
    Sphere {
        center: [f64; 3],
        radius: f64,
    },
    Union {
        members: Vec<Shape>,
    },
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_ramp_fraction() -> f64 {
    RAMP_FRACTION
}

fn default_boundary_period() -> usize {
    BOUNDARY_PERIOD
}

impl Config {
    /// Reads, parses and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML of the
    /// expected shape, or holds an out-of-range value.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    /// Checks every value that the TOML shape alone cannot.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), Error> {
        let app = &self.application;
        if app.name.trim().is_empty() {
            return Err(Error::invalid("application.name", "must not be empty"));
        }
        positive("application.max_phys_time", app.max_phys_time)?;
        if !(0.0..=1.0).contains(&app.ramp_fraction) {
            return Err(Error::invalid(
                "application.ramp_fraction",
                format!("{} is outside [0, 1]", app.ramp_fraction),
            ));
        }
        at_least_one("application.boundary_period", app.boundary_period)?;
        at_least_one("application.discretization.resolution", app.discretization.resolution)?;
        let tau = app.discretization.lattice_relaxation_time;
        if !(tau.is_finite() && tau > 0.5) {
            return Err(Error::invalid(
                "application.discretization.lattice_relaxation_time",
                format!("{tau} must be greater than 0.5"),
            ));
        }
        positive("application.physical.char_length", app.physical.char_length)?;
        positive("application.physical.char_velocity", app.physical.char_velocity)?;
        positive("application.physical.viscosity", app.physical.viscosity)?;
        positive("application.physical.density", app.physical.density)?;

        at_least_one("parallel.workers", self.parallel.workers)?;
        at_least_one("parallel.cuboids_per_worker", self.parallel.cuboids_per_worker)?;
        at_least_one("parallel.overlap", self.parallel.overlap)?;

        let geometry = &self.geometry;
        positive("geometry.inflow.radius", geometry.inflow.radius)?;
        positive("geometry.outflow0.radius", geometry.outflow0.radius)?;
        positive("geometry.outflow1.radius", geometry.outflow1.radius)?;
        geometry.venturi.validate()
    }

    /// The unit converter of the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the discretization or physical parameters are out
    /// of range.
    pub fn converter(&self) -> Result<UnitConverter, UnitError> {
        let app = &self.application;
        UnitConverter::from_resolution_and_relaxation_time(
            app.discretization.resolution,
            app.discretization.lattice_relaxation_time,
            PhysicalParameters::from_si(
                app.physical.char_length,
                app.physical.char_velocity,
                app.physical.viscosity,
                app.physical.density,
            ),
        )
    }

    /// Voxel spacing in meters.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn spacing(&self) -> f64 {
        let app = &self.application;
        app.physical.char_length / app.discretization.resolution as f64
    }

    /// Partition settings for `workers` workers.
    #[must_use]
    pub fn partition_settings(&self, workers: usize) -> PartitionSettings {
        PartitionSettings::new(self.spacing(), workers)
            .with_cuboids_per_worker(self.parallel.cuboids_per_worker)
    }

    #[must_use]
    pub fn balancer(&self) -> Box<dyn LoadBalancingStrategy> {
        match self.parallel.balancer {
            BalancerKind::Block => Box::new(BlockBalance),
            BalancerKind::Heuristic => Box::new(HeuristicBalance),
        }
    }

    /// Number of the last time step.
    #[must_use]
    pub fn max_steps(&self, converter: &UnitConverter) -> usize {
        converter.lattice_time(Time::new::<second>(self.application.max_phys_time))
    }

    /// The inflow ramp of the run.
    #[must_use]
    pub fn scheduler(&self, converter: &UnitConverter) -> RampScheduler<Box<dyn StartScale>> {
        let app = &self.application;
        let steps = ramp::ramp_steps(
            converter,
            Time::new::<second>(app.max_phys_time),
            app.ramp_fraction,
        );
        let scale: Box<dyn StartScale> = match app.start_scale {
            StartScaleKind::Polynomial => Box::new(PolynomialStartScale::new(steps, 1.0)),
            StartScaleKind::Sinus => Box::new(SinusStartScale::new(steps, 1.0)),
        };
        RampScheduler::new(scale, app.boundary_period)
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
}

impl Geometry {
    /// Indicators of the duct, the inflow and both outflows.
    #[must_use]
    pub fn indicators(&self) -> Indicators {
        Indicators {
            venturi: self.venturi.indicator(),
            inflow: self.inflow.indicator(),
            outflow0: self.outflow0.indicator(),
            outflow1: self.outflow1.indicator(),
        }
    }
}

/// The indicators a run is classified with.
pub struct Indicators {
    pub venturi: Box<dyn Indicator>,
    pub inflow: Cylinder,
    pub outflow0: Cylinder,
    pub outflow1: Cylinder,
}

impl CylinderSpec {
    #[must_use]
    pub fn indicator(&self) -> Cylinder {
        Cylinder::new(
            DVec3::from_array(self.center1),
            DVec3::from_array(self.center2),
            self.radius,
        )
    }
}

impl Shape {
    #[must_use]
    pub fn indicator(&self) -> Box<dyn Indicator> {
        let point = |p: &[f64; 3]| DVec3::from_array(*p);
        match self {
            Self::Cylinder {
                center1,
                center2,
                radius,
            } => Box::new(Cylinder::new(point(center1), point(center2), *radius)),
            Self::Cone {
                center1,
                center2,
                radius1,
                radius2,
            } => Box::new(Cone::new(point(center1), point(center2), *radius1, *radius2)),
            Self::Cuboid { origin, extent } => {
                Box::new(AxisAlignedBox::new(point(origin), point(extent)))
            }
            Self::Sphere { center, radius } => Box::new(Sphere::new(point(center), *radius)),
            Self::Union { members } => {
                Box::new(Union::new(members.iter().map(Self::indicator).collect()))
            }
        }
    }

    fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Cylinder { radius, .. } | Self::Sphere { radius, .. } => {
                positive("geometry.venturi.radius", *radius)
            }
            Self::Cone {
                radius1, radius2, ..
            } => {
                non_negative("geometry.venturi.radius1", *radius1)?;
                non_negative("geometry.venturi.radius2", *radius2)?;
                if *radius1 == 0.0 && *radius2 == 0.0 {
                    return Err(Error::invalid("geometry.venturi", "cone has no volume"));
                }
                Ok(())
            }
            Self::Cuboid { extent, .. } => extent
                .iter()
                .try_for_each(|&length| non_negative("geometry.venturi.extent", length)),
            Self::Union { members } => {
                if members.is_empty() {
                    return Err(Error::invalid("geometry.venturi.members", "union is empty"));
                }
                members.iter().try_for_each(Self::validate)
            }
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(field, format!("{value} must be positive")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(field, format!("{value} must not be negative")))
    }
}

fn at_least_one(field: &'static str, value: usize) -> Result<(), Error> {
    if value >= 1 {
        Ok(())
    } else {
        Err(Error::invalid(field, "must be at least 1"))
    }
}
