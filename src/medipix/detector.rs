//! Default Medipix detector: a single silicon pixel sensor in vacuum.

use crate::errors::SimResult;
use crate::kernel::policies::{DetectorConstruction, DetectorGeometry, PixelSensor};

/// Pixel matrix of a Medipix/Timepix readout chip.
pub const MATRIX_SIZE: u32 = 256;

/// Pixel pitch in mm (55 µm).
pub const PIXEL_PITCH_MM: f64 = 0.055;

/// Default sensor thickness in mm.
pub const SENSOR_THICKNESS_MM: f64 = 0.3;

/// Detector construction for a bare sensor at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct MedipixDetector {
    /// Sensor material
    pub material: String,
    /// Sensor thickness in mm
    pub thickness_mm: f64,
    /// Half length of the world volume in mm
    pub world_half_extent_mm: f64,
}

impl Default for MedipixDetector {
    fn default() -> Self {
        Self {
            material: "G4_Si".to_string(),
            thickness_mm: SENSOR_THICKNESS_MM,
            world_half_extent_mm: 50.0,
        }
    }
}

impl DetectorConstruction for MedipixDetector {
    fn construct(&self) -> SimResult<DetectorGeometry> {
        let geometry = DetectorGeometry {
            world_half_extent_mm: self.world_half_extent_mm,
            sensor: PixelSensor {
                columns: MATRIX_SIZE,
                rows: MATRIX_SIZE,
                pitch_mm: PIXEL_PITCH_MM,
                thickness_mm: self.thickness_mm,
                material: self.material.clone(),
                front_z_mm: 0.0,
            },
        };
        geometry.validate()?;
        Ok(geometry)
    }
}
