//! Command-line and environment configuration for the simulation bootstrap.
//!
//! The command line accepts exactly three flags, each consuming one value:
//! - `-m <macro>`: run in batch mode, executing the macro
//! - `-u <UIsession>`: session label handed to the interactive shell
//! - `-t <nThreads>`: worker thread count for the multi-threaded run manager
//!
//! The run manager flavour is a runtime choice read from the environment,
//! so the worker count is always part of the configuration and simply
//! ignored by the sequential run manager.

use crate::errors::{MAX_ARGUMENTS, UsageError};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Worker threads used when `-t` is not given.
pub const DEFAULT_WORKER_THREADS: u16 = 4;

/// Environment variable selecting the run manager flavour.
pub const RUN_MANAGER_TYPE_VAR: &str = "MEDIPIX_RUN_MANAGER_TYPE";

/// Configuration record built once from the command line.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "medipix",
    about,
    long_about = None,
    args_override_self = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Config {
    /// Macro file to execute in batch mode
    #[arg(short = 'm', value_name = "macro")]
    pub script_path: Option<String>,

    /// Interactive session type
    #[arg(short = 'u', value_name = "UIsession")]
    pub session_label: Option<String>,

    /// Number of worker threads (multi-threaded run manager only)
    #[arg(
        short = 't',
        value_name = "nThreads",
        default_value_t = DEFAULT_WORKER_THREADS,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub worker_threads: u16,
}

/// Execution mode selected by the presence of a macro path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode<'a> {
    /// Execute one macro and exit
    Batch {
        /// Macro handed to `/control/execute`
        script: &'a str,
    },
    /// Open a command session
    Interactive {
        /// Optional session label for the shell
        session: Option<&'a str>,
    },
}

impl Config {
    /// Builds the configuration from a full argument list, program name first.
    ///
    /// Parsing is pure: the same argument list always yields the same record.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::TooManyArguments`] when more than
    /// [`MAX_ARGUMENTS`] tokens follow the program name, and
    /// [`UsageError::InvalidArgument`] for unrecognized flags, flags without a
    /// value and malformed thread counts.
    pub fn try_from_args<I, T>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let given = args.len().saturating_sub(1);
        if given > MAX_ARGUMENTS {
            return Err(UsageError::TooManyArguments(given));
        }

        Self::try_parse_from(flag_pairs(args)?).map_err(|e| {
            let rendered = e.to_string();
            let first_line = rendered.lines().next().unwrap_or_default();
            UsageError::InvalidArgument(
                first_line.trim_start_matches("error: ").trim().to_string(),
            )
        })
    }

    /// Selects batch or interactive mode.
    #[must_use]
    pub fn mode(&self) -> Mode<'_> {
        match self.script_path.as_deref() {
            Some(script) => Mode::Batch { script },
            None => Mode::Interactive {
                session: self.session_label.as_deref(),
            },
        }
    }
}

/// Flags accepted on the command line, each followed by exactly one value.
const FLAGS: [&str; 3] = ["-m", "-u", "-t"];

/// Walks the tokens after the program name as flag/value pairs.
///
/// Each flag position must hold exactly one of [`FLAGS`]; the value that
/// follows is taken verbatim, even when it starts with `-`. Pairs are
/// rewritten as `-f=value` so clap cannot reinterpret either token.
fn flag_pairs(args: Vec<OsString>) -> Result<Vec<OsString>, UsageError> {
    let mut tokens = args.into_iter();
    let mut pairs: Vec<OsString> = tokens.next().into_iter().collect();

    while let Some(flag) = tokens.next() {
        let Some(name) = flag.to_str().filter(|f| FLAGS.contains(f)) else {
            return Err(UsageError::InvalidArgument(format!(
                "unexpected argument '{}' found",
                flag.to_string_lossy()
            )));
        };
        let Some(value) = tokens.next() else {
            return Err(UsageError::InvalidArgument(format!(
                "a value is required for '{name}' but none was supplied"
            )));
        };
        let mut pair = OsString::from(format!("{name}="));
        pair.push(value);
        pairs.push(pair);
    }
    Ok(pairs)
}

/// Usage banner printed to the error stream on any usage error.
#[must_use]
pub fn usage() -> String {
    [
        " Usage: ",
        " medipix [-m macro ] [-u UIsession] [-t nThreads]",
        "   note: -t option is honoured only by the multi-threaded run manager.",
        "",
    ]
    .join("\n")
}

/// Run manager flavour, chosen at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunManagerKind {
    /// Events processed on the calling thread
    Serial,
    /// Events distributed over worker threads
    #[default]
    MultiThreaded,
}

impl RunManagerKind {
    /// Interprets the value of [`RUN_MANAGER_TYPE_VAR`].
    ///
    /// Unknown values fall back to the default with a warning.
    #[must_use]
    pub fn from_env_value(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return Self::default();
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "serial" | "sequential" => Self::Serial,
            "mt" | "multithreaded" | "tasking" => Self::MultiThreaded,
            other => {
                log::warn!("Unknown run manager type {other:?}, using the default");
                Self::default()
            }
        }
    }

    /// Reads [`RUN_MANAGER_TYPE_VAR`] from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(RUN_MANAGER_TYPE_VAR).ok().as_deref())
    }
}

/// Directories searched for macros that are not found as given:
/// the working directory, then `<config dir>/medipix/macros`.
#[must_use]
pub fn macro_search_path() -> Vec<PathBuf> {
    let mut path = vec![PathBuf::from(".")];
    if let Some(config_dir) = dirs::config_dir() {
        path.push(config_dir.join("medipix").join("macros"));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(args: &[&str]) -> Result<Config, UsageError> {
        Config::try_from_args(std::iter::once("medipix").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).expect("empty argument list is valid");
        assert_eq!(config.script_path, None);
        assert_eq!(config.session_label, None);
        assert_eq!(config.worker_threads, DEFAULT_WORKER_THREADS);
        assert_eq!(config.mode(), Mode::Interactive { session: None });
    }

    #[test]
    fn test_all_flags_any_order() {
        let config = parse(&["-t", "8", "-u", "tcsh", "-m", "run.mac"]).expect("valid flags");
        assert_eq!(config.script_path.as_deref(), Some("run.mac"));
        assert_eq!(config.session_label.as_deref(), Some("tcsh"));
        assert_eq!(config.worker_threads, 8);
        assert_eq!(config.mode(), Mode::Batch { script: "run.mac" });
    }

    #[test]
    fn test_repeated_flag_last_wins() {
        let config = parse(&["-m", "a.mac", "-m", "b.mac"]).expect("repeated flag");
        assert_eq!(config.script_path.as_deref(), Some("b.mac"));
    }

    #[test]
    fn test_too_many_arguments() {
        let result = parse(&["-m", "a.mac", "-u", "x", "-t", "2", "-m"]);
        assert_eq!(result, Err(UsageError::TooManyArguments(7)));
    }

    #[test]
    fn test_unrecognized_flag_any_position() {
        for args in [
            &["-x", "1", "-m", "run.mac"][..],
            &["-m", "run.mac", "-x", "1"][..],
            &["-x", "1"][..],
            &["run.mac"][..],
            &["--"][..],
            &["-m", "run.mac", "--"][..],
            &["-mrun.mac"][..],
            &["-m=run.mac"][..],
            &["-t8"][..],
            &["--m", "run.mac"][..],
        ] {
            assert!(
                matches!(parse(args), Err(UsageError::InvalidArgument(_))),
                "{args:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_dangling_flag_rejected() {
        assert!(matches!(
            parse(&["-u", "tcsh", "-m"]),
            Err(UsageError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_values_taken_verbatim() {
        let config = parse(&["-m", "-x.mac", "-u", "--"]).expect("hyphenated values");
        assert_eq!(config.script_path.as_deref(), Some("-x.mac"));
        assert_eq!(config.session_label.as_deref(), Some("--"));

        let config = parse(&["-m", "a=b.mac"]).expect("value with equals sign");
        assert_eq!(config.script_path.as_deref(), Some("a=b.mac"));
    }

    #[test]
    fn test_invalid_thread_count() {
        assert!(parse(&["-t", "many"]).is_err());
        assert!(parse(&["-t", "0"]).is_err());
    }

    #[test]
    fn test_help_flag_is_unrecognized() {
        assert!(parse(&["-h"]).is_err());
    }

    #[test]
    fn test_usage_banner() {
        let text = usage();
        assert!(text.contains("[-m macro ]"));
        assert!(text.contains("[-t nThreads]"));
    }

    #[test]
    fn test_run_manager_kind() {
        assert_eq!(RunManagerKind::from_env_value(None), RunManagerKind::MultiThreaded);
        assert_eq!(RunManagerKind::from_env_value(Some("Serial")), RunManagerKind::Serial);
        assert_eq!(RunManagerKind::from_env_value(Some("MT")), RunManagerKind::MultiThreaded);
        assert_eq!(
            RunManagerKind::from_env_value(Some("bogus")),
            RunManagerKind::MultiThreaded
        );
    }

    #[test]
    fn test_macro_search_path_starts_in_working_dir() {
        assert_eq!(macro_search_path()[0], PathBuf::from("."));
    }

    proptest! {
        #[test]
        fn parsing_is_pure(
            script in proptest::option::of("[a-z]{1,8}\\.mac"),
            session in proptest::option::of("[a-z]{1,6}"),
            threads in proptest::option::of(1u16..64),
        ) {
            let mut args = vec!["medipix".to_string()];
            if let Some(script) = &script {
                args.extend(["-m".to_string(), script.clone()]);
            }
            if let Some(session) = &session {
                args.extend(["-u".to_string(), session.clone()]);
            }
            if let Some(threads) = threads {
                args.extend(["-t".to_string(), threads.to_string()]);
            }

            let first = Config::try_from_args(&args);
            let second = Config::try_from_args(&args);
            prop_assert_eq!(&first, &second);

            let config = first.expect("generated arguments are valid");
            prop_assert_eq!(config.script_path, script);
            prop_assert_eq!(config.session_label, session);
            prop_assert_eq!(config.worker_threads, threads.unwrap_or(DEFAULT_WORKER_THREADS));
        }
    }
}
