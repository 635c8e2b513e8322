//! Conversion between physical and lattice units.
//!
//! The lattice works in dimensionless units where the voxel spacing and the
//! time step are both one. [`UnitConverter`] holds the physical size of those
//! units and converts quantities in both directions.

use std::{fs, io, path::Path};

use thiserror::Error;
use tracing::info;
use uom::si::{
    f64::{KinematicViscosity, Length, MassDensity, Pressure, Ratio, Time, Velocity},
    kinematic_viscosity::square_meter_per_second,
    length::meter,
    mass_density::kilogram_per_cubic_meter,
    pressure::pascal,
    ratio::ratio,
    time::second,
    velocity::meter_per_second,
};

/// Squared lattice speed of sound.
const CS2: f64 = 1.0 / 3.0;

/// Errors that can occur when building a [`UnitConverter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("resolution must be at least 1")]
    Resolution,

    #[error("lattice relaxation time must be finite and greater than 0.5")]
    RelaxationTime,

    #[error("physical parameter `{0}` must be finite and positive")]
    NonPositive(&'static str),
}

/// Characteristic physical parameters of a run, in SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalParameters {
    pub char_length: Length,
    pub char_velocity: Velocity,
    pub viscosity: KinematicViscosity,
    pub density: MassDensity,
}

impl PhysicalParameters {
    /// Creates parameters from plain SI values.
    #[must_use]
    pub fn from_si(char_length: f64, char_velocity: f64, viscosity: f64, density: f64) -> Self {
        Self {
            char_length: Length::new::<meter>(char_length),
            char_velocity: Velocity::new::<meter_per_second>(char_velocity),
            viscosity: KinematicViscosity::new::<square_meter_per_second>(viscosity),
            density: MassDensity::new::<kilogram_per_cubic_meter>(density),
        }
    }
}

/// Converts between physical and lattice units.
///
/// Built from a resolution `N` (voxels per characteristic length) and the
/// lattice relaxation time `tau`:
///
/// ```text
/// dx = char_length / N
/// dt = (tau - 1/2) * cs² * dx² / viscosity
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    resolution: usize,
    relaxation_time: f64,
    physical: PhysicalParameters,
    delta_x: Length,
    delta_t: Time,
}

impl UnitConverter {
    /// Creates a converter from resolution and relaxation time.
    ///
    /// # Errors
    ///
    /// Returns a [`UnitError`] if the resolution is zero, the relaxation time
    /// is not above one half, or a physical parameter is not positive.
    pub fn from_resolution_and_relaxation_time(
        resolution: usize,
        relaxation_time: f64,
        physical: PhysicalParameters,
    ) -> Result<Self, UnitError> {
        if resolution == 0 {
            return Err(UnitError::Resolution);
        }
        if !relaxation_time.is_finite() || relaxation_time <= 0.5 {
            return Err(UnitError::RelaxationTime);
        }
        check_positive("char_length", physical.char_length.get::<meter>())?;
        check_positive("char_velocity", physical.char_velocity.get::<meter_per_second>())?;
        check_positive("viscosity", physical.viscosity.get::<square_meter_per_second>())?;
        check_positive("density", physical.density.get::<kilogram_per_cubic_meter>())?;

        let delta_x = physical.char_length / resolution as f64;
        let delta_t: Time = delta_x * delta_x / physical.viscosity * ((relaxation_time - 0.5) * CS2);

        Ok(Self {
            resolution,
            relaxation_time,
            physical,
            delta_x,
            delta_t,
        })
    }

    #[must_use]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[must_use]
    pub fn physical(&self) -> &PhysicalParameters {
        &self.physical
    }

    /// Physical length of one voxel.
    #[must_use]
    pub fn conversion_length(&self) -> Length {
        self.delta_x
    }

    /// Physical duration of one time step.
    #[must_use]
    pub fn conversion_time(&self) -> Time {
        self.delta_t
    }

    /// Lattice relaxation frequency.
    #[must_use]
    pub fn omega(&self) -> f64 {
        1.0 / self.relaxation_time
    }

    /// Reynolds number of the characteristic flow.
    #[must_use]
    pub fn reynolds(&self) -> f64 {
        let re: Ratio =
            self.physical.char_velocity * self.physical.char_length / self.physical.viscosity;
        re.get::<ratio>()
    }

    /// Characteristic velocity in lattice units.
    #[must_use]
    pub fn char_lattice_velocity(&self) -> f64 {
        let u: Ratio = self.physical.char_velocity * self.delta_t / self.delta_x;
        u.get::<ratio>()
    }

    /// Number of time steps covering `time`, rounded to the nearest step.
    ///
    /// Negative and non-finite durations map to zero steps.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn lattice_time(&self, time: Time) -> usize {
        let steps: Ratio = time / self.delta_t;
        let steps = steps.get::<ratio>().round();
        if steps.is_finite() && steps > 0.0 {
            steps as usize
        } else {
            0
        }
    }

    /// Number of time steps covering `seconds` of physical time.
    #[must_use]
    pub fn lattice_time_seconds(&self, seconds: f64) -> usize {
        self.lattice_time(Time::new::<second>(seconds))
    }

    /// Physical time reached after `step` time steps.
    #[must_use]
    pub fn phys_time(&self, step: usize) -> Time {
        self.delta_t * step as f64
    }

    /// Converts a lattice velocity to a physical velocity.
    #[must_use]
    pub fn phys_velocity(&self, lattice_velocity: f64) -> Velocity {
        self.delta_x / self.delta_t * lattice_velocity
    }

    /// Physical pressure of one lattice pressure unit.
    #[must_use]
    pub fn conversion_pressure(&self) -> Pressure {
        let velocity = self.delta_x / self.delta_t;
        self.physical.density * velocity * velocity
    }

    /// Converts a lattice density to a physical pressure relative to the
    /// reference density.
    #[must_use]
    pub fn phys_pressure(&self, lattice_density: f64) -> Pressure {
        self.conversion_pressure() * ((lattice_density - 1.0) * CS2)
    }

    /// Returns the converter parameters as `(name, value)` lines.
    #[must_use]
    pub fn summary(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("resolution N", self.resolution as f64),
            ("lattice velocity", self.char_lattice_velocity()),
            ("lattice relaxation time tau", self.relaxation_time),
            ("lattice relaxation frequency omega", self.omega()),
            ("characteristic length [m]", self.physical.char_length.get::<meter>()),
            (
                "characteristic velocity [m/s]",
                self.physical.char_velocity.get::<meter_per_second>(),
            ),
            (
                "viscosity [m^2/s]",
                self.physical.viscosity.get::<square_meter_per_second>(),
            ),
            (
                "density [kg/m^3]",
                self.physical.density.get::<kilogram_per_cubic_meter>(),
            ),
            ("Reynolds number", self.reynolds()),
            ("voxel length [m]", self.delta_x.get::<meter>()),
            ("time step [s]", self.delta_t.get::<second>()),
            ("pressure unit [Pa]", self.conversion_pressure().get::<pascal>()),
        ]
    }

    /// Logs the converter parameters.
    pub fn log(&self) {
        info!("----------------- unit converter -----------------");
        for (name, value) in self.summary() {
            info!("{name:<38}= {value}");
        }
        info!("--------------------------------------------------");
    }

    /// Writes the converter parameters to a text file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> io::Result<()> {
        let contents: String = self
            .summary()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}\n"))
            .collect();
        fs::write(path, contents)
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), UnitError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(UnitError::NonPositive(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn converter() -> UnitConverter {
        // dx = 0.1 m, dt = (0.8 - 0.5) / 3 * 0.01 / 0.01 = 0.1 s
        UnitConverter::from_resolution_and_relaxation_time(
            10,
            0.8,
            PhysicalParameters::from_si(1.0, 0.1, 0.01, 1000.0),
        )
        .unwrap()
    }

    #[test]
    fn spacing_and_time_step() {
        let converter = converter();
        assert_relative_eq!(converter.conversion_length().get::<meter>(), 0.1);
        assert_relative_eq!(converter.conversion_time().get::<second>(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn lattice_time_rounds_to_nearest_step() {
        let converter = converter();
        assert_eq!(converter.lattice_time_seconds(1.0), 10);
        assert_eq!(converter.lattice_time_seconds(0.26), 3);
        assert_eq!(converter.lattice_time_seconds(0.0), 0);
        assert_eq!(converter.lattice_time_seconds(-3.0), 0);
        assert_eq!(converter.lattice_time_seconds(f64::NAN), 0);
        assert_relative_eq!(converter.phys_time(25).get::<second>(), 2.5, epsilon = 1e-12);
    }

    #[test]
    fn derived_numbers() {
        let converter = converter();
        assert_relative_eq!(converter.omega(), 1.25);
        assert_relative_eq!(converter.reynolds(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(converter.char_lattice_velocity(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(
            converter.phys_velocity(0.1).get::<meter_per_second>(),
            0.1,
            epsilon = 1e-12
        );
        assert_relative_eq!(converter.phys_pressure(1.0).get::<pascal>(), 0.0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let physical = PhysicalParameters::from_si(1.0, 0.1, 0.001, 1000.0);
        assert_eq!(
            UnitConverter::from_resolution_and_relaxation_time(0, 0.8, physical),
            Err(UnitError::Resolution)
        );
        assert_eq!(
            UnitConverter::from_resolution_and_relaxation_time(10, 0.5, physical),
            Err(UnitError::RelaxationTime)
        );
        let physical = PhysicalParameters::from_si(1.0, 0.1, -1.0, 1000.0);
        assert_eq!(
            UnitConverter::from_resolution_and_relaxation_time(10, 0.8, physical),
            Err(UnitError::NonPositive("viscosity"))
        );
    }
}
