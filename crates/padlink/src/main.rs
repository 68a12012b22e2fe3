mod cli;
mod commands;
mod logging;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse_from(cli::normalize_args(std::env::args_os()));
    let helper = cli.sdl2.is_some();
    if let Err(e) = logging::setup(cli.verbose, cli.no_color, helper) {
        // Nowhere else to report it.
        let _ = writeln!(std::io::stderr(), "unable to set up logger: {e}");
    }

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
