//! Command interpreter.
//!
//! Commands are `/directory/leaf parameters...` strings. The `/control/`
//! directory is built in; `/run/`, `/event/` and `/tracking/` go to the run
//! kernel; everything else goes to the messenger registered for the longest
//! matching directory.

use crate::errors::CommandError;
use crate::interfaces::Messenger;
use crate::kernel::run_manager::RunKernel;
use std::fs;
use std::path::{Path, PathBuf};

/// Limit on macros executing macros.
pub const MAX_MACRO_DEPTH: usize = 16;

const KERNEL_DIRECTORIES: [&str; 3] = ["/run/", "/event/", "/tracking/"];

/// Splits a command line into its path and the remaining parameters.
#[must_use]
pub fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((path, parameters)) => (path, parameters.trim()),
        None => (line, ""),
    }
}

fn parse_level(command: &str, parameters: &str) -> Result<u8, CommandError> {
    parameters
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidParameter {
            command: command.to_string(),
            reason: format!("{parameters:?} is not a verbosity level"),
        })
}

/// Dispatches commands to built-ins, the run kernel and messengers.
pub struct UiManager {
    messengers: Vec<Box<dyn Messenger>>,
    macro_path: Vec<PathBuf>,
    verbose: u8,
    depth: usize,
    history: Vec<String>,
}

impl UiManager {
    /// Creates an interpreter resolving macros through `macro_path`.
    #[must_use]
    pub fn new(macro_path: Vec<PathBuf>) -> Self {
        Self {
            messengers: Vec::new(),
            macro_path,
            verbose: 0,
            depth: 0,
            history: Vec::new(),
        }
    }

    /// Commands applied successfully, in order.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Registers `messenger`; a directory may be served only once.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::DuplicateDirectory`] if the directory is taken.
    pub fn register(&mut self, messenger: Box<dyn Messenger>) -> Result<(), CommandError> {
        let directory = messenger.directory();
        if self.messengers.iter().any(|m| m.directory() == directory)
            || KERNEL_DIRECTORIES.contains(&directory)
            || directory == "/control/"
        {
            return Err(CommandError::DuplicateDirectory(directory.to_string()));
        }
        log::debug!("Registered messenger for {directory}");
        self.messengers.push(messenger);
        Ok(())
    }

    /// All directories the interpreter can dispatch to.
    #[must_use]
    pub fn directories(&self) -> Vec<String> {
        std::iter::once("/control/")
            .chain(KERNEL_DIRECTORIES)
            .map(str::to_string)
            .chain(self.messengers.iter().map(|m| m.directory().to_string()))
            .collect()
    }

    /// Applies one command line.
    ///
    /// Blank lines and `#` comments are accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns the failure of the command.
    pub fn apply(&mut self, line: &str, kernel: &mut RunKernel) -> Result<(), CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        if self.verbose >= 2 {
            println!("{line}");
        }

        let (path, parameters) = split_command(line);
        match path {
            "/control/execute" => self.execute_macro(parameters, kernel)?,
            "/control/echo" => println!("{parameters}"),
            "/control/verbose" => self.verbose = parse_level(path, parameters)?,
            "/control/macroPath" => {
                self.macro_path = parameters.split(':').map(PathBuf::from).collect();
            }
            _ if KERNEL_DIRECTORIES.iter().any(|dir| path.starts_with(dir)) => {
                kernel.apply_command(path, parameters)?;
            }
            _ => self.dispatch(path, parameters)?,
        }

        self.history.push(line.to_string());
        Ok(())
    }

    fn dispatch(&mut self, path: &str, parameters: &str) -> Result<(), CommandError> {
        let messenger = self
            .messengers
            .iter_mut()
            .filter(|m| path.starts_with(m.directory()))
            .max_by_key(|m| m.directory().len())
            .ok_or_else(|| CommandError::NotFound(path.to_string()))?;
        let leaf = &path[messenger.directory().len()..];
        messenger.apply(leaf, parameters)
    }

    fn resolve_macro(&self, name: &str) -> PathBuf {
        let direct = Path::new(name);
        if direct.is_absolute() || direct.exists() {
            return direct.to_path_buf();
        }
        self.macro_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.exists())
            .unwrap_or_else(|| direct.to_path_buf())
    }

    fn execute_macro(
        &mut self,
        parameters: &str,
        kernel: &mut RunKernel,
    ) -> Result<(), CommandError> {
        let name = parameters
            .split_whitespace()
            .next()
            .ok_or_else(|| CommandError::InvalidParameter {
                command: "/control/execute".to_string(),
                reason: "macro file name missing".to_string(),
            })?;
        if self.depth >= MAX_MACRO_DEPTH {
            return Err(CommandError::NestingTooDeep(MAX_MACRO_DEPTH));
        }

        let path = self.resolve_macro(name);
        let contents = fs::read_to_string(&path).map_err(|e| CommandError::MacroUnreadable {
            path: name.to_string(),
            reason: e.to_string(),
        })?;
        log::debug!("Executing macro {}", path.display());

        self.depth += 1;
        let result = contents.lines().enumerate().try_for_each(|(index, line)| {
            self.apply(line, kernel)
                .map_err(|source| CommandError::MacroAborted {
                    path: path.display().to_string(),
                    line: index + 1,
                    source: Box::new(source),
                })
        });
        self.depth -= 1;
        result
    }
}
