//! Persisted score matrices keyed by experimental configuration.
//!
//! Computing a matrix costs one predictor call per evaluated user and POI, so
//! the evaluation loop consults a [`ScoreMatrixCache`] first. Any change to
//! the model, dataset, variant, or sparsity ratio yields a different
//! [`CacheKey`] and therefore a miss.

use std::fmt;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::{MatrixShapeError, ModelKind, ScoreMatrix};

mod file;

pub use file::FileScoreCache;

/// Identity of one reproducible score matrix.
///
/// # Examples
/// ```
/// use lore_core::{CacheKey, ModelKind};
///
/// let key = CacheKey::new("LORE", "Gowalla", ModelKind::Density, 0.8);
/// assert_eq!(key.variant_tag(), "KDE_0.8");
/// assert_eq!(key.to_string(), "LORE_Gowalla_KDE_0.8");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    /// Fused model family, e.g. `LORE`.
    pub model_name: String,
    /// Dataset the matrix was computed from.
    pub dataset_name: String,
    /// Which predictor produced the matrix.
    pub kind: ModelKind,
    /// Fraction of interaction data kept for training.
    pub sparsity_ratio: f64,
}

impl CacheKey {
    /// Build a key from its parts.
    pub fn new(
        model_name: impl Into<String>,
        dataset_name: impl Into<String>,
        kind: ModelKind,
        sparsity_ratio: f64,
    ) -> Self {
        Self {
            model_name: model_name.into(),
            dataset_name: dataset_name.into(),
            kind,
            sparsity_ratio,
        }
    }

    /// Variant tag combining the predictor and sparsity ratio.
    #[must_use]
    pub fn variant_tag(&self) -> String {
        format!("{}_{}", self.kind.tag(), self.sparsity_ratio)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.model_name,
            self.dataset_name,
            self.variant_tag()
        )
    }
}

/// Errors raised while loading or storing cached matrices.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing file failed.
    #[error("cache I/O failed at {path}: {source}")]
    Io {
        /// Cache entry location.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The cached payload could not be decoded.
    #[error("failed to decode cached matrix at {path}: {source}")]
    Decode {
        /// Cache entry location.
        path: Utf8PathBuf,
        /// Decoder error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The matrix could not be encoded.
    #[error("failed to encode matrix for {path}: {source}")]
    Encode {
        /// Cache entry location.
        path: Utf8PathBuf,
        /// Encoder error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The file did not start with the cache header.
    #[error("invalid cache magic at {path}: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Cache entry location.
        path: Utf8PathBuf,
        /// Expected header bytes.
        expected: [u8; 4],
        /// Header bytes read.
        found: [u8; 4],
    },
    /// The file was written by an incompatible format version.
    #[error("unsupported cache version {found} at {path}; supported version is {supported}")]
    UnsupportedVersion {
        /// Cache entry location.
        path: Utf8PathBuf,
        /// Version in the header.
        found: u16,
        /// Version this build reads.
        supported: u16,
    },
    /// The file holds a matrix for a different key.
    #[error("cache entry at {path} belongs to {found}, expected {expected}")]
    ForeignEntry {
        /// Cache entry location.
        path: Utf8PathBuf,
        /// Key requested.
        expected: String,
        /// Key recorded in the file.
        found: String,
    },
    /// A cached matrix does not fit the current dataset.
    #[error("cached matrix {key} does not fit the dataset: {source}")]
    Shape {
        /// Key of the rejected entry.
        key: String,
        /// Shape problem.
        #[source]
        source: MatrixShapeError,
    },
    /// The storage backend refused the request.
    #[error("cache backend unavailable for {key}")]
    Unavailable {
        /// Key of the failed request.
        key: String,
    },
}

/// Load and store score matrices by [`CacheKey`].
///
/// `load` returns `Ok(None)` when nothing was stored for the key; errors are
/// reserved for a backend that exists but cannot be used. `store` overwrites
/// any earlier entry.
pub trait ScoreMatrixCache {
    /// Retrieve the matrix stored under `key`.
    ///
    /// # Errors
    /// Returns [`CacheError`] when the backend cannot be read or the entry is
    /// corrupt.
    fn load(&self, key: &CacheKey) -> Result<Option<ScoreMatrix>, CacheError>;

    /// Persist `matrix` under `key`, replacing any earlier entry.
    ///
    /// # Errors
    /// Returns [`CacheError`] when the backend cannot be written.
    fn store(&mut self, key: &CacheKey, matrix: &ScoreMatrix) -> Result<(), CacheError>;
}

impl<C: ScoreMatrixCache + ?Sized> ScoreMatrixCache for &mut C {
    fn load(&self, key: &CacheKey) -> Result<Option<ScoreMatrix>, CacheError> {
        (**self).load(key)
    }

    fn store(&mut self, key: &CacheKey, matrix: &ScoreMatrix) -> Result<(), CacheError> {
        (**self).store(key, matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ModelKind::Social, 1.0, "LORE_Yelp_FCF_1")]
    #[case(ModelKind::Transition, 0.5, "LORE_Yelp_AMC_0.5")]
    fn keys_render_stable_names(#[case] kind: ModelKind, #[case] ratio: f64, #[case] name: &str) {
        let key = CacheKey::new("LORE", "Yelp", kind, ratio);
        assert_eq!(key.to_string(), name);
    }

    #[rstest]
    fn sparsity_ratio_changes_key_identity() {
        let dense = CacheKey::new("LORE", "Yelp", ModelKind::Social, 1.0);
        let sparse = CacheKey::new("LORE", "Yelp", ModelKind::Social, 0.8);
        assert_ne!(dense.to_string(), sparse.to_string());
    }
}
