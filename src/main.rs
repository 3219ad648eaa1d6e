//! Medipix simulation binary executable.
//!
//! Parses the command line, seeds the random engine and runs the simulation
//! in batch or interactive mode. Usage errors exit with status 1; failures
//! further down are logged and the process still exits normally.

use medipix_sim::config::usage;
use medipix_sim::{Config, run};

fn main() {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let config = match Config::try_from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(" {e}");
            eprint!("{}", usage());
            std::process::exit(1);
        }
    };

    // Only usage errors change the exit status.
    match run(&config, &args) {
        Ok(()) => {
            log::info!("Medipix simulation completed successfully");
        }
        Err(e) => {
            log::error!("Medipix simulation failed: {e}");
        }
    }
}
