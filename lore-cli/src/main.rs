//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use lore_cli::CliError;

fn main() {
    match lore_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("lore: {err}");
            std::process::exit(1);
        }
    }
}
