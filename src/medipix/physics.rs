//! Standard electromagnetic physics for low-energy X-ray and beta imaging.

use crate::kernel::policies::{ParticleProcesses, PhysicsList};

const PROCESS_TABLE: &[(&str, &[&str])] = &[
    ("gamma", &["phot", "compt", "conv", "Rayl"]),
    ("e-", &["msc", "eIoni", "eBrem", "CoulombScat"]),
    ("e+", &["msc", "eIoni", "eBrem", "annihil", "CoulombScat"]),
    ("proton", &["msc", "hIoni", "hBrems", "hPairProd"]),
    ("alpha", &["msc", "ionIoni", "nuclearStopping"]),
    ("mu-", &["msc", "muIoni", "muBrems", "muPairProd"]),
    ("mu+", &["msc", "muIoni", "muBrems", "muPairProd"]),
];

/// Electromagnetic physics list with a fine production cut.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardPhysics {
    /// Production cut in mm
    pub cut_mm: f64,
}

impl Default for StandardPhysics {
    fn default() -> Self {
        Self { cut_mm: 0.01 }
    }
}

impl PhysicsList for StandardPhysics {
    fn construct_processes(&self) -> Vec<ParticleProcesses> {
        PROCESS_TABLE
            .iter()
            .map(|(particle, processes)| ParticleProcesses {
                particle: (*particle).to_string(),
                processes: processes.iter().map(|p| (*p).to_string()).collect(),
            })
            .collect()
    }

    fn default_cut_mm(&self) -> f64 {
        self.cut_mm
    }
}
