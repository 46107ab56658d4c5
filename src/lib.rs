//! Facade crate for the LORE recommendation engine.
//!
//! This crate re-exports the core domain types, the three scoring models and
//! the evaluation loop. Dataset loading from disk sits behind the `data`
//! feature, enabled by default.

#![forbid(unsafe_code)]

pub use lore_core::{
    CacheError, CacheKey, ConfigurationError, Dataset, DatasetSize, FileScoreCache, GroundTruth,
    ModelKind, PoiCoordinates, PoiId, Predictor, PredictorError, ScoreMatrix, ScoreMatrixCache,
    SocialRelations, TrainingCheckins, TrainingMatrix, UserId,
};

pub use lore_scorer::{DensityScorer, SocialParams, SocialScorer, TransitionParams, TransitionScorer};

pub use lore_eval::{
    EvaluationConfig, EvaluationError, EvaluationLoop, EvaluationReport, ExecutionRecord,
    PredictorSet, RankedList, fuse, rank,
};

#[cfg(feature = "data")]
pub use lore_data::{DatasetError, DatasetFiles, load_dataset};
