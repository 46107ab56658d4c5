//! Error types emitted by the LORE CLI.
//!
//! Keep this error type reasonably small; every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use lore_core::{ConfigurationError, PredictorError};
use lore_data::DatasetError;
use lore_eval::EvaluationError;
use thiserror::Error;

/// Errors emitted by the LORE CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Long flag name.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// The merged options describe an impossible run.
    #[error(transparent)]
    InvalidOptions(#[from] ConfigurationError),
    /// A model tuning parameter is out of range.
    #[error(transparent)]
    InvalidParameter(#[from] PredictorError),
    /// A dataset file is missing, unreadable or malformed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// The execution record could not be created.
    #[error("failed to create execution record in {path:?}: {source}")]
    CreateRecord {
        /// Output directory.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The evaluation run failed.
    #[error("evaluation failed: {0}")]
    Evaluation(#[source] Box<EvaluationError>),
    /// Serialising the evaluation report failed.
    #[error("failed to serialise evaluation report: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing the evaluation report failed.
    #[error("failed to write evaluation report: {0}")]
    WriteReport(#[source] std::io::Error),
}

impl From<EvaluationError> for CliError {
    fn from(err: EvaluationError) -> Self {
        Self::Evaluation(Box::new(err))
    }
}
