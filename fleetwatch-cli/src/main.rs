//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use fleetwatch_cli::CliError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match fleetwatch_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            // Nothing further can report a failed write to stderr.
            drop(fleetwatch_cli::report_error(&mut std::io::stderr(), &err));
            std::process::exit(1);
        }
    }
}
