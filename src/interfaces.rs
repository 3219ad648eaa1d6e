//! Collaborator interfaces used by the bootstrap.
//!
//! The bootstrap only talks to the run controller, command interpreter,
//! interactive shell and visualization manager through these traits, which
//! keeps the lifecycle testable with recording doubles.

use crate::config::RunManagerKind;
use crate::errors::{CommandError, SimResult};
use crate::kernel::policies::{ActionInitialization, DetectorConstruction, PhysicsList};
use crate::kernel::run_manager::RunState;
use crate::random::RandomEngine;
use crate::session::vis::Verbosity;

/// Handler for one command directory such as `/gun/`.
pub trait Messenger {
    /// Directory served, with leading and trailing `/`.
    fn directory(&self) -> &str;

    /// Leaf command names, for help listings.
    fn commands(&self) -> &[&'static str];

    /// Apply `command` (the leaf name, without the directory).
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotFound`] for unknown leaves and
    /// [`CommandError::InvalidParameter`] for malformed parameters.
    fn apply(&mut self, command: &str, parameters: &str) -> Result<(), CommandError>;
}

/// Executes command strings.
pub trait CommandInterpreter {
    /// Apply one command line, e.g. `/control/execute run.mac`.
    ///
    /// # Errors
    ///
    /// Returns the failure of the command; macros stop at the first failure.
    fn apply_command(&mut self, command: &str) -> Result<(), CommandError>;

    /// Register a messenger. Each directory may have exactly one messenger.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::DuplicateDirectory`] if the directory is taken.
    fn register_messenger(&mut self, messenger: Box<dyn Messenger>) -> Result<(), CommandError>;

    /// Command directories currently known.
    fn directories(&self) -> Vec<String>;
}

/// The simulation run controller.
pub trait RunController: CommandInterpreter {
    /// Request a worker count. The sequential model ignores it.
    fn set_worker_threads(&mut self, threads: u16);

    /// Worker count in effect, `None` for the sequential model.
    fn worker_threads(&self) -> Option<u16>;

    /// Take ownership of the detector construction.
    fn set_detector_construction(&mut self, detector: Box<dyn DetectorConstruction>);

    /// Take ownership of the physics list.
    fn set_physics_list(&mut self, physics: Box<dyn PhysicsList>);

    /// Take ownership of the action initialization.
    fn set_action_initialization(&mut self, actions: Box<dyn ActionInitialization>);

    /// Build geometry and physics so events can be processed.
    ///
    /// # Errors
    ///
    /// Fails if a mandatory initialization is missing or the geometry is invalid.
    fn initialize(&mut self) -> SimResult<()>;

    /// Current lifecycle state.
    fn state(&self) -> RunState;
}

/// Operator-facing command session.
pub trait InteractiveShell {
    /// Whether the session runs inside a graphical front end.
    fn is_graphical(&self) -> bool;

    /// Block until the operator ends the session.
    ///
    /// # Errors
    ///
    /// Returns I/O failures of the session transport.
    fn session_start(&mut self, interpreter: &mut dyn CommandInterpreter) -> SimResult<()>;
}

/// Visualization manager.
pub trait Visualization {
    /// Attach to the interpreter so `/vis/` commands become available.
    ///
    /// # Errors
    ///
    /// Fails if the visualization commands cannot be registered.
    fn initialize(&mut self, interpreter: &mut dyn CommandInterpreter) -> SimResult<()>;
}

/// Factory for the external services the bootstrap drives.
pub trait Platform {
    /// Run controller type
    type Runner: RunController;
    /// Interactive shell type
    type Shell: InteractiveShell;
    /// Visualization manager type
    type Vis: Visualization;

    /// Construct the run controller around the seeded engine.
    fn create_run_controller(&mut self, kind: RunManagerKind, engine: RandomEngine)
    -> Self::Runner;

    /// Construct the interactive shell.
    fn create_shell(&mut self, args: &[String], session: Option<&str>) -> Self::Shell;

    /// Construct the visualization manager.
    fn create_visualization(&mut self, verbosity: Verbosity) -> Self::Vis;
}

/// The user-supplied simulation: three policies plus the primary-generator
/// messenger.
pub trait Application {
    /// Detector geometry policy
    fn detector_construction(&self) -> Box<dyn DetectorConstruction>;

    /// Physics policy
    fn physics_list(&self) -> Box<dyn PhysicsList>;

    /// Event/action policy
    fn action_initialization(&self) -> Box<dyn ActionInitialization>;

    /// Messenger configuring the primary generator.
    fn primary_generator_messenger(&self) -> Box<dyn Messenger>;
}
