#![allow(clippy::multiple_crate_versions)]
#![warn(missing_docs)]

//! Bootstrap and run control for a Medipix pixel-detector simulation.
//!
//! This library wires a user application (detector construction, physics
//! list, action initialization and the primary-generator messenger) into a
//! run manager and drives it either from a batch macro or from an interactive
//! command session.
//!
//! # Key Features
//!
//! - Three-flag command line (`-m`, `-u`, `-t`) with strict usage checking
//! - Time-based seeding with `JOB_ID` perturbation for parallel jobs
//! - Sequential or multi-threaded run manager chosen at runtime
//! - Macro interpreter with `/control/`, `/run/` and messenger directories
//! - Ordered teardown: shell, visualization manager, run manager
//!
//! # Example
//!
//! ```rust,no_run
//! use medipix_sim::{Config, run};
//!
//! let args = ["medipix", "-m", "run.mac"];
//! let config = Config::try_from_args(args).expect("valid arguments");
//! let args: Vec<String> = args.iter().map(ToString::to_string).collect();
//! run(&config, &args).expect("simulation");
//! ```

// Module declarations (avoiding mod.rs files)
/// Error types for the simulation bootstrap.
pub mod errors;

/// Command-line and environment configuration.
pub mod config;

/// Seedable pseudo-random engine.
pub mod random;

/// Time-based seed derivation.
pub mod seed;

/// Collaborator traits driven by the bootstrap.
pub mod interfaces;

/// Construct, configure, run and release.
pub mod bootstrap;

/// Services used by the standalone binary.
pub mod platform;

/// Run control: user initializations, run manager and command interpreter.
pub mod kernel {
    /// User initialization traits and geometry types.
    pub mod policies;
    /// Run manager and run kernel.
    pub mod run_manager;
    /// Command interpreter.
    pub mod ui_manager;
    /// Unit parsing for command parameters.
    pub mod units;
}

/// Operator-facing session components.
pub mod session {
    /// Terminal shell.
    pub mod shell;
    /// Visualization manager.
    pub mod vis;
}

/// The Medipix user application.
pub mod medipix {
    /// Application wiring.
    pub mod application;
    /// Sensor geometry.
    pub mod detector;
    /// Particle gun and action initialization.
    pub mod gun;
    /// `/gun/` messenger.
    pub mod messenger;
    /// Physics list.
    pub mod physics;
}

// Re-exports for convenience
pub use bootstrap::launch;
pub use config::{Config, Mode, RunManagerKind};
pub use errors::{CommandError, SimError, SimResult, UsageError};
pub use interfaces::{
    Application, CommandInterpreter, InteractiveShell, Messenger, Platform, RunController,
    Visualization,
};
pub use kernel::run_manager::{RunManager, RunState, RunSummary};
pub use medipix::application::Medipix;
pub use platform::StandalonePlatform;
pub use random::RandomEngine;

use seed::{JOB_ID_VAR, SystemClock};

/// Seeds the engine and runs the Medipix application on the standalone platform.
///
/// `args` are the full process arguments, handed to the interactive shell.
///
/// # Errors
///
/// Returns failures of the batch macro, of initialization or of the
/// interactive session.
pub fn run(config: &Config, args: &[String]) -> SimResult<()> {
    let mut engine = RandomEngine::default();
    let job_id = std::env::var(JOB_ID_VAR).ok();
    seed::seed_engine(&SystemClock, job_id.as_deref(), &mut engine);

    let kind = RunManagerKind::from_env();
    log::info!("Run manager type: {kind:?}");

    let application = Medipix::new();
    let mut platform = StandalonePlatform::new(config::macro_search_path());
    launch(&mut platform, &application, config, args, kind, engine)
}
