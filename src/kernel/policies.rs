//! User initialization policies handed to the run manager.
//!
//! The run manager takes ownership of one detector construction, one physics
//! list and one action initialization. Action initializations are shared by
//! all worker threads and build a fresh set of user actions per worker.

use crate::errors::{SimError, SimResult};
use crate::random::RandomEngine;

/// A segmented planar sensor centred on the beam axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSensor {
    /// Pixel columns along x
    pub columns: u32,
    /// Pixel rows along y
    pub rows: u32,
    /// Pixel pitch in mm
    pub pitch_mm: f64,
    /// Sensor thickness in mm
    pub thickness_mm: f64,
    /// Sensor material name
    pub material: String,
    /// z position of the front face in mm
    pub front_z_mm: f64,
}

impl PixelSensor {
    /// Sensor width along x in mm.
    #[must_use]
    pub fn width_mm(&self) -> f64 {
        f64::from(self.columns) * self.pitch_mm
    }

    /// Sensor height along y in mm.
    #[must_use]
    pub fn height_mm(&self) -> f64 {
        f64::from(self.rows) * self.pitch_mm
    }

    /// Pixel `(column, row)` containing the point `(x, y)` on the front face.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pixel_at(&self, x_mm: f64, y_mm: f64) -> Option<(u32, u32)> {
        let u = x_mm + self.width_mm() / 2.0;
        let v = y_mm + self.height_mm() / 2.0;
        if !(0.0..self.width_mm()).contains(&u) || !(0.0..self.height_mm()).contains(&v) {
            return None;
        }
        let column = ((u / self.pitch_mm).floor() as u32).min(self.columns - 1);
        let row = ((v / self.pitch_mm).floor() as u32).min(self.rows - 1);
        Some((column, row))
    }
}

/// Geometry produced by a detector construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorGeometry {
    /// Half length of the cubic world volume in mm
    pub world_half_extent_mm: f64,
    /// The sensitive sensor
    pub sensor: PixelSensor,
}

impl DetectorGeometry {
    /// Checks that the geometry can be tracked through.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidGeometry`] for empty or non-positive
    /// dimensions and sensors that do not fit in the world.
    pub fn validate(&self) -> SimResult<()> {
        let sensor = &self.sensor;
        if sensor.columns == 0 || sensor.rows == 0 {
            return Err(SimError::InvalidGeometry(format!(
                "sensor has {}x{} pixels",
                sensor.columns, sensor.rows
            )));
        }
        if sensor.pitch_mm <= 0.0 || sensor.thickness_mm <= 0.0 {
            return Err(SimError::InvalidGeometry(
                "pixel pitch and thickness must be positive".to_string(),
            ));
        }
        let half = self.world_half_extent_mm;
        if sensor.width_mm() / 2.0 > half
            || sensor.height_mm() / 2.0 > half
            || sensor.front_z_mm.abs() + sensor.thickness_mm > half
        {
            return Err(SimError::InvalidGeometry(format!(
                "sensor does not fit in a world of half extent {half} mm"
            )));
        }
        Ok(())
    }
}

/// Builds the detector geometry.
pub trait DetectorConstruction {
    /// Construct the geometry; called once by `initialize`.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry cannot be built.
    fn construct(&self) -> SimResult<DetectorGeometry>;
}

/// Physics processes attached to one particle type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticleProcesses {
    /// Particle name, e.g. `e-`
    pub particle: String,
    /// Process names in registration order
    pub processes: Vec<String>,
}

/// Declares particles and the processes attached to them.
pub trait PhysicsList {
    /// Particle/process table built during initialization.
    fn construct_processes(&self) -> Vec<ParticleProcesses>;

    /// Production cut in mm.
    fn default_cut_mm(&self) -> f64;
}

/// A primary particle emitted at the start of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Primary {
    /// Particle name
    pub particle: String,
    /// Kinetic energy in MeV
    pub energy_mev: f64,
    /// Vertex position in mm
    pub position_mm: [f64; 3],
    /// Unit momentum direction
    pub direction: [f64; 3],
}

/// Produces the primary particle of each event.
pub trait PrimaryGenerator {
    /// Generate the primary for one event.
    fn generate_primaries(&mut self, engine: &mut RandomEngine) -> Primary;
}

/// Per-thread user actions built by an [`ActionInitialization`].
pub struct UserActions {
    /// Primary generator of this thread
    pub primary_generator: Box<dyn PrimaryGenerator>,
}

/// Builds user actions for the master and for each worker thread.
pub trait ActionInitialization: Send + Sync {
    /// Hook for master-only actions; called once during initialization.
    fn build_for_master(&self) {}

    /// Build the actions used by `worker`.
    fn build(&self, worker: usize) -> UserActions;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor() -> PixelSensor {
        PixelSensor {
            columns: 4,
            rows: 2,
            pitch_mm: 1.0,
            thickness_mm: 0.5,
            material: "G4_Si".to_string(),
            front_z_mm: 0.0,
        }
    }

    #[test]
    fn test_pixel_lookup() {
        let sensor = sensor();
        assert_eq!(sensor.pixel_at(-2.0, -1.0), Some((0, 0)));
        assert_eq!(sensor.pixel_at(0.5, 0.5), Some((2, 1)));
        assert_eq!(sensor.pixel_at(1.99, 0.99), Some((3, 1)));
        assert_eq!(sensor.pixel_at(2.0, 0.0), None);
        assert_eq!(sensor.pixel_at(0.0, -1.5), None);
    }

    #[test]
    fn test_geometry_validation() {
        let geometry = DetectorGeometry {
            world_half_extent_mm: 10.0,
            sensor: sensor(),
        };
        assert!(geometry.validate().is_ok());

        let too_small = DetectorGeometry {
            world_half_extent_mm: 1.0,
            ..geometry.clone()
        };
        assert!(too_small.validate().is_err());

        let empty = DetectorGeometry {
            sensor: PixelSensor {
                rows: 0,
                ..sensor()
            },
            ..geometry
        };
        assert!(matches!(empty.validate(), Err(SimError::InvalidGeometry(_))));
    }
}
