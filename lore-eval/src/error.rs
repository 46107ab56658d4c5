//! Errors that abort an evaluation run.

use camino::Utf8PathBuf;
use lore_core::{CacheError, ConfigurationError, MatrixShapeError, ModelKind, PredictorError};
use thiserror::Error;

/// Fatal failures of the evaluation loop.
///
/// Recoverable conditions, such as an unreadable cache entry or a model with
/// insufficient data, are logged and never surface here.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The run configuration or dataset is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A predictor failed to prepare or score.
    #[error("{model} predictor failed: {source}")]
    Predictor {
        /// Failing model.
        model: ModelKind,
        /// Error raised by the predictor.
        #[source]
        source: PredictorError,
    },
    /// A freshly computed matrix could not be persisted.
    #[error("failed to store {key}: {source}")]
    CacheStore {
        /// Key being written.
        key: String,
        /// Error raised by the cache.
        #[source]
        source: CacheError,
    },
    /// A computed row did not fit the dataset shape.
    #[error("{model} matrix does not fit the dataset: {source}")]
    Matrix {
        /// Model whose matrix was being filled.
        model: ModelKind,
        /// Shape problem.
        #[source]
        source: MatrixShapeError,
    },
    /// Writing the execution record failed.
    #[error("failed to write execution record {path}: {source}")]
    Record {
        /// Record location.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
