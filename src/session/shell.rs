//! Line-oriented terminal session.

use crate::errors::SimResult;
use crate::interfaces::{CommandInterpreter, InteractiveShell};
use std::io::{self, BufRead, Write};

const PROMPT: &str = "medipix> ";

/// Session labels served by the terminal shell.
const TERMINAL_LABELS: [&str; 3] = ["terminal", "tcsh", "csh"];

/// Terminal command session over any line reader and writer.
pub struct TerminalShell<R, W> {
    label: String,
    reader: R,
    writer: W,
    history: Vec<String>,
}

impl TerminalShell<io::StdinLock<'static>, io::Stdout> {
    /// Opens a session on the process terminal.
    ///
    /// `args` are the process arguments; only the program name is used, for
    /// the banner.
    #[must_use]
    pub fn stdio(args: &[String], session: Option<&str>) -> Self {
        let program = args.first().map_or("medipix", String::as_str);
        log::debug!("Opening terminal session for {program}");
        Self::with_io(session, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalShell<R, W> {
    /// Opens a session reading commands from `reader`.
    pub fn with_io(session: Option<&str>, reader: R, writer: W) -> Self {
        let label = match session {
            None | Some("") => "terminal".to_string(),
            Some(label) if TERMINAL_LABELS.contains(&label) => label.to_string(),
            Some(label) => {
                log::warn!("Session type {label:?} is not available, using the terminal");
                "terminal".to_string()
            }
        };
        Self {
            label,
            reader,
            writer,
            history: Vec::new(),
        }
    }

    /// Session label in effect.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Lines entered during the session.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Consumes the shell, returning its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn print_help(&mut self, interpreter: &dyn CommandInterpreter) -> io::Result<()> {
        writeln!(self.writer, "Command directories:")?;
        for directory in interpreter.directories() {
            writeln!(self.writer, "  {directory}")?;
        }
        writeln!(self.writer, "Type exit to end the session.")
    }
}

impl<R: BufRead, W: Write> InteractiveShell for TerminalShell<R, W> {
    fn is_graphical(&self) -> bool {
        false
    }

    fn session_start(&mut self, interpreter: &mut dyn CommandInterpreter) -> SimResult<()> {
        let mut line = String::new();
        loop {
            write!(self.writer, "{PROMPT}")?;
            self.writer.flush()?;

            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                writeln!(self.writer)?;
                break;
            }
            let command = line.trim();
            match command {
                "" => continue,
                "exit" | "quit" => break,
                "help" => self.print_help(interpreter)?,
                "history" => {
                    for (index, entry) in self.history.iter().enumerate() {
                        writeln!(self.writer, "{index:4}: {entry}")?;
                    }
                }
                _ => {
                    if let Err(e) = interpreter.apply_command(command) {
                        writeln!(self.writer, "{e}")?;
                    }
                }
            }
            self.history.push(command.to_string());
        }
        log::debug!("Session {} ended", self.label);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunManagerKind;
    use crate::kernel::run_manager::RunManager;
    use crate::random::RandomEngine;

    fn run_session(input: &str) -> (String, Vec<String>, RunManager) {
        let mut run = RunManager::new(RunManagerKind::Serial, RandomEngine::default(), Vec::new());
        let mut shell = TerminalShell::with_io(None, input.as_bytes(), Vec::new());
        shell.session_start(&mut run).expect("session");
        let history = shell.history().to_vec();
        let output = String::from_utf8(shell.into_writer()).expect("utf8 output");
        (output, history, run)
    }

    #[test]
    fn test_labels() {
        let shell = TerminalShell::with_io(Some("tcsh"), &b""[..], Vec::<u8>::new());
        assert_eq!(shell.label(), "tcsh");
        assert!(!shell.is_graphical());

        let fallback = TerminalShell::with_io(Some("qt"), &b""[..], Vec::<u8>::new());
        assert_eq!(fallback.label(), "terminal");
    }

    #[test]
    fn test_exit_ends_session() {
        let (_, history, run) = run_session("/control/verbose 0\nexit\n/control/verbose 1\n");
        assert_eq!(history, ["/control/verbose 0"]);
        assert_eq!(run.history(), ["/control/verbose 0"]);
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let (output, _, _) = run_session("\n\n");
        assert!(output.starts_with(PROMPT));
    }

    #[test]
    fn test_failures_are_reported_not_fatal() {
        let (output, history, _) = run_session("/nowhere/cmd\n/control/verbose 1\nquit\n");
        assert!(output.contains("command </nowhere/cmd> not found"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_help_lists_directories() {
        let (output, _, _) = run_session("help\n");
        assert!(output.contains("/control/"));
        assert!(output.contains("/run/"));
    }
}
