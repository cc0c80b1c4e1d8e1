//! Resgen - Command-line tool for embedding static assets in C++ projects

use std::process::ExitCode;

use resgen::cli;

fn main() -> ExitCode {
    cli::run()
}
