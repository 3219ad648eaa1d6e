//! Particle gun and the action initialization that hands one to each worker.
//!
//! All guns read the same [`SharedGunSettings`], which the `/gun/` messenger
//! writes. Each event snapshots the settings, so a command issued between
//! runs affects every worker from the next run on.

use crate::kernel::policies::{ActionInitialization, Primary, PrimaryGenerator, UserActions};
use crate::random::RandomEngine;
use std::sync::{Arc, Mutex, PoisonError};

/// Beam parameters configurable through `/gun/` commands.
#[derive(Debug, Clone, PartialEq)]
pub struct GunSettings {
    /// Particle name
    pub particle: String,
    /// Kinetic energy in MeV
    pub energy_mev: f64,
    /// Beam centre in mm
    pub position_mm: [f64; 3],
    /// Unit direction
    pub direction: [f64; 3],
    /// Side of the square beam footprint in mm; 0 for a pencil beam
    pub spread_mm: f64,
}

impl Default for GunSettings {
    /// 60 keV photons (Am-241 line) fired along +z from 10 mm upstream.
    fn default() -> Self {
        Self {
            particle: "gamma".to_string(),
            energy_mev: 0.06,
            position_mm: [0.0, 0.0, -10.0],
            direction: [0.0, 0.0, 1.0],
            spread_mm: 0.0,
        }
    }
}

/// Gun settings shared between the messenger and every worker's gun.
pub type SharedGunSettings = Arc<Mutex<GunSettings>>;

/// Primary generator emitting one particle per event.
#[derive(Debug, Clone)]
pub struct ParticleGun {
    settings: SharedGunSettings,
}

impl ParticleGun {
    /// Creates a gun reading `settings`.
    #[must_use]
    pub const fn new(settings: SharedGunSettings) -> Self {
        Self { settings }
    }
}

impl PrimaryGenerator for ParticleGun {
    fn generate_primaries(&mut self, engine: &mut RandomEngine) -> Primary {
        let settings = self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let [x, y, z] = settings.position_mm;
        let half = settings.spread_mm / 2.0;
        let (dx, dy) = if half > 0.0 {
            (
                (2.0f64).mul_add(engine.flat(), -1.0) * half,
                (2.0f64).mul_add(engine.flat(), -1.0) * half,
            )
        } else {
            (0.0, 0.0)
        };

        Primary {
            particle: settings.particle,
            energy_mev: settings.energy_mev,
            position_mm: [x + dx, y + dy, z],
            direction: settings.direction,
        }
    }
}

/// Action initialization giving each worker its own particle gun.
#[derive(Debug, Clone)]
pub struct MedipixActions {
    settings: SharedGunSettings,
}

impl MedipixActions {
    /// Creates actions whose guns read `settings`.
    #[must_use]
    pub const fn new(settings: SharedGunSettings) -> Self {
        Self { settings }
    }
}

impl ActionInitialization for MedipixActions {
    fn build_for_master(&self) {
        let settings = self.settings.lock().unwrap_or_else(PoisonError::into_inner);
        log::debug!(
            "Master gun: {} at {} MeV",
            settings.particle,
            settings.energy_mev
        );
    }

    fn build(&self, _worker: usize) -> UserActions {
        UserActions {
            primary_generator: Box::new(ParticleGun::new(Arc::clone(&self.settings))),
        }
    }
}
