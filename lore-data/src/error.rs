//! Errors raised while reading dataset files.

use camino::Utf8PathBuf;
use lore_core::ConfigurationError;
use thiserror::Error;

/// Errors returned by the dataset readers.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A required dataset file does not exist.
    #[error("dataset file {path} does not exist")]
    MissingFile {
        /// Expected location.
        path: Utf8PathBuf,
    },
    /// Opening or reading a file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A record could not be parsed.
    #[error("malformed record in {path}: {source}")]
    Parse {
        /// File being read.
        path: Utf8PathBuf,
        /// Error from the `csv` reader, including the record position.
        #[source]
        source: csv::Error,
    },
    /// A record violated the declared dataset shape.
    #[error("invalid data in {path}: {source}")]
    Invalid {
        /// File being read.
        path: Utf8PathBuf,
        /// The violated constraint.
        #[source]
        source: ConfigurationError,
    },
    /// The assembled inputs are inconsistent.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
