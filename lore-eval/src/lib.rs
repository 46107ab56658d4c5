//! Fusion, ranking and evaluation of LORE recommendations.
//!
//! The [`EvaluationLoop`] resolves one score matrix per signal model through
//! a [`ScoreMatrixCache`](lore_core::ScoreMatrixCache), then visits every
//! ground-truth user in a seeded shuffled order. For each user it fuses the
//! three matrices ([`fuse`]), ranks the candidates ([`rank`]), updates running
//! precision and recall ([`MetricAccumulator`]), and appends the ranked list
//! to an [`ExecutionRecord`].
//!
//! # Examples
//!
//! ```
//! use lore_core::test_support::{FixedPredictor, MemoryCache};
//! use lore_core::{
//!     Dataset, DatasetSize, GroundTruth, ModelKind, PoiCoordinates, SocialRelations,
//!     TrainingCheckins, TrainingMatrix,
//! };
//! use lore_eval::{EvaluationConfig, EvaluationLoop, ExecutionRecord, PredictorSet};
//!
//! let dataset = Dataset::new(
//!     DatasetSize::new(2, 3),
//!     TrainingMatrix::new().with(0, 0, 1.0),
//!     TrainingCheckins::default(),
//!     SocialRelations::new(),
//!     PoiCoordinates::new(),
//!     GroundTruth::new().with(0, 2),
//! )
//! .expect("valid dataset");
//! let mut predictors = PredictorSet::new(
//!     FixedPredictor::new(ModelKind::Social, 1.0).with_score(0, 2, 2.0),
//!     FixedPredictor::new(ModelKind::Density, 1.0),
//!     FixedPredictor::new(ModelKind::Transition, 1.0),
//! );
//! let config = EvaluationConfig { top_k: 1, top_restricted: 3, ..EvaluationConfig::new("Toy") };
//! let record = ExecutionRecord::from_writer("LORE_Toy_top3.txt", Vec::new());
//!
//! let report = EvaluationLoop::new(config, &dataset, MemoryCache::new(), record)
//!     .expect("valid config")
//!     .run(&mut predictors)
//!     .expect("run succeeds");
//! assert_eq!(report.precision, 1.0);
//! assert_eq!(report.recall, 1.0);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod fusion;
mod metrics;
mod order;
mod pipeline;
mod ranking;
mod record;

pub use error::EvaluationError;
pub use fusion::{MASKED_SCORE, ModelMatrices, fuse};
pub use metrics::{MetricAccumulator, MetricSnapshot, RunningMean, precision_at_k, recall_at_k};
pub use order::shuffled_users;
pub use pipeline::{
    CacheOutcome, DEFAULT_MODEL_NAME, DEFAULT_SPARSITY_RATIO, DEFAULT_TOP_K,
    DEFAULT_TOP_RESTRICTED, EvaluationConfig, EvaluationLoop, EvaluationReport, ModelCacheReport,
    PredictorSet, Stage,
};
pub use ranking::{RankedEntry, RankedList, rank};
pub use record::ExecutionRecord;
