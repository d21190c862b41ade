//! schemamap CLI entry point
//!
//! Parsing, configuration and dispatch live in the CLI module; main only
//! maps failure to a non-zero exit status.

use schemamap::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
