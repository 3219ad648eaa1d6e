//! The Medipix simulation: detector, physics, actions and gun messenger.

use crate::interfaces::{Application, Messenger};
use crate::kernel::policies::{ActionInitialization, DetectorConstruction, PhysicsList};
use crate::medipix::detector::MedipixDetector;
use crate::medipix::gun::{MedipixActions, SharedGunSettings};
use crate::medipix::messenger::PrimaryGeneratorMessenger;
use crate::medipix::physics::StandardPhysics;
use std::sync::Arc;

/// User application wiring the Medipix policies to one set of gun settings.
///
/// The gun settings are created here and injected into both the action
/// initialization and the messenger, so commands reach every worker's gun.
#[derive(Debug, Clone, Default)]
pub struct Medipix {
    gun: SharedGunSettings,
}

impl Medipix {
    /// Creates the application with default gun settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gun settings shared by the messenger and the actions.
    #[must_use]
    pub const fn gun_settings(&self) -> &SharedGunSettings {
        &self.gun
    }
}

impl Application for Medipix {
    fn detector_construction(&self) -> Box<dyn DetectorConstruction> {
        Box::new(MedipixDetector::default())
    }

    fn physics_list(&self) -> Box<dyn PhysicsList> {
        Box::new(StandardPhysics::default())
    }

    fn action_initialization(&self) -> Box<dyn ActionInitialization> {
        Box::new(MedipixActions::new(Arc::clone(&self.gun)))
    }

    fn primary_generator_messenger(&self) -> Box<dyn Messenger> {
        Box::new(PrimaryGeneratorMessenger::new(Arc::clone(&self.gun)))
    }
}
