//! Services used by the `medipix` binary.

use crate::config::RunManagerKind;
use crate::interfaces::Platform;
use crate::kernel::run_manager::RunManager;
use crate::random::RandomEngine;
use crate::session::shell::TerminalShell;
use crate::session::vis::{Verbosity, VisManager};
use std::io;
use std::path::PathBuf;

/// In-process run manager, terminal shell and scene-recording visualization.
#[derive(Debug, Clone)]
pub struct StandalonePlatform {
    macro_path: Vec<PathBuf>,
}

impl StandalonePlatform {
    /// Creates the platform; macros are resolved through `macro_path`.
    #[must_use]
    pub const fn new(macro_path: Vec<PathBuf>) -> Self {
        Self { macro_path }
    }
}

impl Platform for StandalonePlatform {
    type Runner = RunManager;
    type Shell = TerminalShell<io::StdinLock<'static>, io::Stdout>;
    type Vis = VisManager;

    fn create_run_controller(&mut self, kind: RunManagerKind, engine: RandomEngine) -> RunManager {
        RunManager::new(kind, engine, self.macro_path.clone())
    }

    fn create_shell(&mut self, args: &[String], session: Option<&str>) -> Self::Shell {
        TerminalShell::stdio(args, session)
    }

    fn create_visualization(&mut self, verbosity: Verbosity) -> VisManager {
        VisManager::new(verbosity)
    }
}
