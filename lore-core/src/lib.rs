//! Core domain types for the LORE fusion engine.
//!
//! The crate defines the shapes every other crate agrees on: dense user and
//! POI identifiers, the pre-parsed training and evaluation inputs, the
//! [`Predictor`] contract implemented by each signal model, the sparse
//! [`ScoreMatrix`] those models fill, and the [`ScoreMatrixCache`] seam used
//! to avoid recomputing matrices across runs.
//!
//! Constructors validate identifiers against the declared [`DatasetSize`] so
//! downstream stages can index rows without re-checking bounds.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cache;
pub mod dataset;
mod error;
pub mod matrix;
pub mod predictor;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use cache::{CacheError, CacheKey, FileScoreCache, ScoreMatrixCache};
pub use dataset::{
    Checkin, Dataset, DatasetSize, GroundTruth, PoiCoordinates, SocialRelations, TrainingCheckins,
    TrainingContext, TrainingMatrix, TrainingTuples,
};
pub use error::ConfigurationError;
pub use matrix::{MatrixShapeError, ScoreMatrix};
pub use predictor::{ModelKind, Predictor, PredictorError};

/// Dense user identifier in `[0, users)`.
pub type UserId = u32;

/// Dense point-of-interest identifier in `[0, pois)`.
pub type PoiId = u32;
