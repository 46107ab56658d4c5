//! Command-line interface for evaluating LORE recommendations.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod evaluate;

pub use error::CliError;
pub use evaluate::{DEFAULT_CACHE_DIR, DEFAULT_OUTPUT_DIR};

use evaluate::EvaluateArgs;

const ARG_DATASET_DIR: &str = "dataset-dir";
const ARG_DATASET_NAME: &str = "dataset-name";
const ENV_DATASET_DIR: &str = "LORE_CMDS_EVALUATE_DATASET_DIR";
const ENV_DATASET_NAME: &str = "LORE_CMDS_EVALUATE_DATASET_NAME";

/// Run the LORE CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments cannot be parsed or merged, or when
/// the selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Evaluate(args) => evaluate::run_evaluate(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "lore",
    about = "Offline evaluation of fused social, spatial and sequential POI recommendations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank candidates for every held-out user and report precision and recall.
    Evaluate(EvaluateArgs),
}

#[cfg(test)]
mod tests;
