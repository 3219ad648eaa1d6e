//! Bootstrap lifecycle: construct, configure, run, release.
//!
//! The run controller is built first and released last. In interactive mode
//! the shell is released before the visualization manager, and both before
//! the run controller, which owns the user initializations they may still
//! reference.

use crate::config::{Config, Mode, RunManagerKind};
use crate::errors::{SimError, SimResult};
use crate::interfaces::{
    Application, CommandInterpreter, InteractiveShell, Platform, RunController, Visualization,
};
use crate::random::RandomEngine;
use crate::session::vis::Verbosity;

/// Startup macro executed when an interactive session opens.
pub const VIS_INIT_MACRO: &str = "init_vis.mac";

/// Startup macro executed only under a graphical shell.
pub const GUI_MACRO: &str = "gui.mac";

/// Executes a startup macro; a missing or failing startup macro is reported
/// and the session continues.
fn run_startup_macro(interpreter: &mut dyn CommandInterpreter, name: &str) {
    if let Err(e) = interpreter.apply_command(&format!("/control/execute {name}")) {
        log::warn!("Startup macro {name} not applied: {e}");
    }
}

/// Runs the simulation described by `config` on `platform`.
///
/// `engine` must already be seeded; it is handed to the run controller.
///
/// # Errors
///
/// Returns failures of the batch macro, of initialization, of the
/// visualization manager or of the interactive session transport.
pub fn launch<P, A>(
    platform: &mut P,
    application: &A,
    config: &Config,
    args: &[String],
    kind: RunManagerKind,
    engine: RandomEngine,
) -> SimResult<()>
where
    P: Platform,
    A: Application,
{
    let mut run_manager = platform.create_run_controller(kind, engine);
    run_manager.set_worker_threads(config.worker_threads);
    if let Some(threads) = run_manager.worker_threads() {
        println!("Set number of threads {threads}");
    }

    run_manager.set_detector_construction(application.detector_construction());
    run_manager.set_physics_list(application.physics_list());
    run_manager.set_action_initialization(application.action_initialization());

    let mut shell: Option<P::Shell> = None;
    let mut vis: Option<P::Vis> = None;

    let outcome = match run_manager.register_messenger(application.primary_generator_messenger()) {
        Err(e) => Err(SimError::from(e)),
        Ok(()) => match config.mode() {
            Mode::Batch { script } => {
                println!("Batch mode ...");
                run_manager
                    .apply_command(&format!("/control/execute {script}"))
                    .map_err(SimError::from)
            }
            Mode::Interactive { session } => {
                println!("Interactive mode ...");
                run_interactive(platform, &mut run_manager, args, session, &mut shell, &mut vis)
            }
        },
    };

    // Shell first, then visualization, then the run controller.
    drop(shell);
    drop(vis);
    drop(run_manager);
    outcome
}

fn run_interactive<P: Platform>(
    platform: &mut P,
    run_manager: &mut P::Runner,
    args: &[String],
    session: Option<&str>,
    shell: &mut Option<P::Shell>,
    vis: &mut Option<P::Vis>,
) -> SimResult<()> {
    run_manager.initialize()?;

    let shell = shell.insert(platform.create_shell(args, session));
    let vis = vis.insert(platform.create_visualization(Verbosity::Quiet));
    vis.initialize(run_manager)?;

    run_startup_macro(run_manager, VIS_INIT_MACRO);
    if shell.is_graphical() {
        run_startup_macro(run_manager, GUI_MACRO);
    }
    shell.session_start(run_manager)
}
