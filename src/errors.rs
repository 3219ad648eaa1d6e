//! Error types for the Medipix simulation bootstrap.

use crate::kernel::run_manager::RunState;

/// Maximum number of argument tokens accepted after the program name.
pub const MAX_ARGUMENTS: usize = 6;

/// Command-line usage errors. These are the only errors handled by the
/// bootstrap itself; they always terminate the process with status 1.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    /// More argument tokens than the parser accepts
    #[error("too many arguments: {0} given, at most {MAX_ARGUMENTS} accepted")]
    TooManyArguments(usize),

    /// Unrecognized flag, missing value or malformed value
    #[error("{0}")]
    InvalidArgument(String),
}

/// Failures reported by the command interpreter and its messengers.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// No built-in command or registered messenger handles the path
    #[error("command <{0}> not found")]
    NotFound(String),

    /// Parameters could not be parsed or are out of range
    #[error("invalid parameter for <{command}>: {reason}")]
    InvalidParameter {
        /// Full command path
        command: String,
        /// Human-readable reason
        reason: String,
    },

    /// Command is not allowed in the current application state
    #[error("command <{command}> refused: {reason}")]
    IllegalState {
        /// Full command path
        command: String,
        /// Why the state forbids the command
        reason: String,
    },

    /// Macro file could not be located or read
    #[error("cannot open macro file <{path}>: {reason}")]
    MacroUnreadable {
        /// Macro name as given to `/control/execute`
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// A command inside a macro failed; execution of the macro stopped there
    #[error("macro <{path}> interrupted at line {line}: {source}")]
    MacroAborted {
        /// Macro file path
        path: String,
        /// One-based line number of the failing command
        line: usize,
        /// The failure of that command
        source: Box<CommandError>,
    },

    /// Macros executing macros beyond the nesting limit
    #[error("macro nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    /// A messenger for this directory already exists
    #[error("a messenger for directory {0} is already registered")]
    DuplicateDirectory(String),

    /// The run controller rejected the command
    #[error("<{command}> failed: {source}")]
    Run {
        /// Full command path
        command: String,
        /// Run controller failure
        source: Box<SimError>,
    },
}

/// Main error type for simulation setup and run control.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// One of the three mandatory user initializations was never registered
    #[error("mandatory user initialization missing: {0}")]
    MissingInitialization(&'static str),

    /// Operation attempted in the wrong lifecycle state
    #[error("{action} is not allowed while the run manager is {state:?}")]
    InvalidState {
        /// Operation that was refused
        action: &'static str,
        /// Current lifecycle state
        state: RunState,
    },

    /// Detector construction produced an unusable geometry
    #[error("invalid detector geometry: {0}")]
    InvalidGeometry(String),

    /// Primary particle has no entry in the physics table
    #[error("particle {0} is not defined by the physics list")]
    UnknownParticle(String),

    /// A worker thread panicked during event processing
    #[error("worker thread {0} panicked")]
    WorkerPanicked(usize),

    /// Command interpreter failure
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Terminal or file I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_mentions_limit() {
        let message = UsageError::TooManyArguments(8).to_string();
        assert!(message.contains('8'));
        assert!(message.contains(&MAX_ARGUMENTS.to_string()));
    }

    #[test]
    fn macro_abort_chains_source() {
        let error = CommandError::MacroAborted {
            path: "run.mac".to_string(),
            line: 3,
            source: Box::new(CommandError::NotFound("/bogus/cmd".to_string())),
        };
        let message = error.to_string();
        assert!(message.contains("run.mac"));
        assert!(message.contains("line 3"));
        assert!(message.contains("/bogus/cmd"));
    }
}
