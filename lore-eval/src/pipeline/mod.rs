//! The evaluation loop driving cache lookups, fusion, ranking and metrics.
//!
//! A run walks a fixed sequence of stages. Each model stage loads its score
//! matrix from the cache, or precomputes and predicts it on a miss and stores
//! the result. The final stage fuses the three matrices per user in a seeded
//! shuffled order, ranks the candidates, accumulates precision and recall, and
//! appends the ranked list to the execution record.

use std::io::Write;

use camino::Utf8PathBuf;
use lore_core::{
    CacheKey, ConfigurationError, Dataset, ModelKind, Predictor, ScoreMatrix, ScoreMatrixCache,
};
use lore_scorer::{DensityScorer, SocialParams, SocialScorer, TransitionParams, TransitionScorer};
use serde::{Deserialize, Serialize};

use crate::{
    EvaluationError, ExecutionRecord, MetricAccumulator, MetricSnapshot, ModelMatrices, fuse,
    precision_at_k, rank, recall_at_k, shuffled_users,
};

/// Model name used in cache keys and record names unless overridden.
pub const DEFAULT_MODEL_NAME: &str = "LORE";
/// Default metric cut-off.
pub const DEFAULT_TOP_K: usize = 10;
/// Default ranked list length.
pub const DEFAULT_TOP_RESTRICTED: usize = 100;
/// Default sparsity ratio tag.
pub const DEFAULT_SPARSITY_RATIO: f64 = 1.0;

/// Parameters of one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    /// Model name, shared by cache keys and the record name.
    pub model_name: String,
    /// Dataset name, shared by cache keys and the record name.
    pub dataset_name: String,
    /// Metric cut-off.
    pub top_k: usize,
    /// Number of ranked entries kept per user.
    pub top_restricted: usize,
    /// Sparsity ratio, part of every cache key.
    pub sparsity_ratio: f64,
    /// Seed of the evaluation order.
    pub seed: u64,
}

impl EvaluationConfig {
    /// Configuration for `dataset_name` with default parameters.
    #[must_use]
    pub fn new(dataset_name: impl Into<String>) -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_owned(),
            dataset_name: dataset_name.into(),
            top_k: DEFAULT_TOP_K,
            top_restricted: DEFAULT_TOP_RESTRICTED,
            sparsity_ratio: DEFAULT_SPARSITY_RATIO,
            seed: 0,
        }
    }

    /// Check the parameters before any computation.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] when a name is blank, `top_k` is zero
    /// or exceeds `top_restricted`, or the sparsity ratio is not finite.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName {
                field: "model_name",
            });
        }
        if self.dataset_name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName {
                field: "dataset_name",
            });
        }
        if self.top_k == 0 {
            return Err(ConfigurationError::ZeroTopK);
        }
        if self.top_k > self.top_restricted {
            return Err(ConfigurationError::TopKExceedsRestricted {
                top_k: self.top_k,
                top_restricted: self.top_restricted,
            });
        }
        if !self.sparsity_ratio.is_finite() {
            return Err(ConfigurationError::NonFiniteSparsityRatio {
                ratio: self.sparsity_ratio,
            });
        }
        Ok(())
    }

    /// Cache key of the matrix produced by `kind` in this run.
    #[must_use]
    pub fn cache_key(&self, kind: ModelKind) -> CacheKey {
        CacheKey::new(
            self.model_name.as_str(),
            self.dataset_name.as_str(),
            kind,
            self.sparsity_ratio,
        )
    }
}

/// Position of a run in its fixed stage sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has happened yet.
    Init,
    /// Resolving the matrix of one model.
    PerModel(ModelKind),
    /// Fusing, ranking and scoring users.
    FuseRankScore,
    /// The run finished.
    Done,
}

impl Stage {
    /// The stage that follows this one; [`Stage::Done`] is terminal.
    ///
    /// # Examples
    /// ```
    /// use lore_core::ModelKind;
    /// use lore_eval::Stage;
    ///
    /// assert_eq!(Stage::Init.next(), Stage::PerModel(ModelKind::Social));
    /// assert_eq!(Stage::PerModel(ModelKind::Transition).next(), Stage::FuseRankScore);
    /// ```
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Init => Self::PerModel(ModelKind::Social),
            Self::PerModel(ModelKind::Social) => Self::PerModel(ModelKind::Density),
            Self::PerModel(ModelKind::Density) => Self::PerModel(ModelKind::Transition),
            Self::PerModel(ModelKind::Transition) => Self::FuseRankScore,
            Self::FuseRankScore | Self::Done => Self::Done,
        }
    }
}

/// One predictor per signal family.
pub struct PredictorSet {
    social: Box<dyn Predictor>,
    density: Box<dyn Predictor>,
    transition: Box<dyn Predictor>,
}

impl PredictorSet {
    /// Bundle three predictors, one per slot.
    #[must_use]
    pub fn new(
        social: impl Predictor + 'static,
        density: impl Predictor + 'static,
        transition: impl Predictor + 'static,
    ) -> Self {
        Self {
            social: Box::new(social),
            density: Box::new(density),
            transition: Box::new(transition),
        }
    }

    /// The LORE scorers with the given parameters.
    #[must_use]
    pub fn lore(social: SocialParams, transition: TransitionParams) -> Self {
        Self::new(
            SocialScorer::new(social),
            DensityScorer::new(),
            TransitionScorer::new(transition),
        )
    }

    /// Predictor filling the `kind` slot.
    #[must_use]
    pub fn get(&self, kind: ModelKind) -> &dyn Predictor {
        match kind {
            ModelKind::Social => self.social.as_ref(),
            ModelKind::Density => self.density.as_ref(),
            ModelKind::Transition => self.transition.as_ref(),
        }
    }

    /// Mutable predictor filling the `kind` slot.
    pub fn get_mut(&mut self, kind: ModelKind) -> &mut dyn Predictor {
        match kind {
            ModelKind::Social => self.social.as_mut(),
            ModelKind::Density => self.density.as_mut(),
            ModelKind::Transition => self.transition.as_mut(),
        }
    }
}

impl Default for PredictorSet {
    fn default() -> Self {
        Self::lore(SocialParams::default(), TransitionParams::default())
    }
}

impl std::fmt::Debug for PredictorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictorSet")
            .field("social", &self.social.kind())
            .field("density", &self.density.kind())
            .field("transition", &self.transition.kind())
            .finish()
    }
}

/// How a model's matrix was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOutcome {
    /// Loaded from the cache and valid.
    Hit,
    /// Not cached; computed and stored.
    Miss,
    /// Cached but unreadable or invalid; recomputed and stored.
    Rebuilt,
}

/// Cache outcome of one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCacheReport {
    /// Model concerned.
    pub model: ModelKind,
    /// How its matrix was obtained.
    pub outcome: CacheOutcome,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Mean precision@K over evaluated users.
    pub precision: f64,
    /// Mean recall@K over evaluated users.
    pub recall: f64,
    /// Number of users evaluated.
    pub users_evaluated: u32,
    /// Per-model cache outcomes, in stage order.
    pub cache: Vec<ModelCacheReport>,
    /// Location of the execution record.
    pub record_path: Utf8PathBuf,
}

/// Single-threaded driver of one evaluation.
///
/// The loop owns its cache and execution record; pass `&mut cache` to keep
/// using a cache after the loop is dropped.
#[derive(Debug)]
pub struct EvaluationLoop<'a, C, W: Write> {
    config: EvaluationConfig,
    dataset: &'a Dataset,
    cache: C,
    record: ExecutionRecord<W>,
    stage: Stage,
}

impl<'a, C, W> EvaluationLoop<'a, C, W>
where
    C: ScoreMatrixCache,
    W: Write,
{
    /// Validate `config` and prepare a run over `dataset`.
    ///
    /// # Errors
    /// Returns [`EvaluationError::Configuration`] when `config` is invalid.
    pub fn new(
        config: EvaluationConfig,
        dataset: &'a Dataset,
        cache: C,
        record: ExecutionRecord<W>,
    ) -> Result<Self, EvaluationError> {
        config.validate()?;
        Ok(Self {
            config,
            dataset,
            cache,
            record,
            stage: Stage::Init,
        })
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Cache used by the run.
    #[must_use]
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Execution record written by the run.
    #[must_use]
    pub const fn record(&self) -> &ExecutionRecord<W> {
        &self.record
    }

    /// Release the cache and execution record.
    #[must_use]
    pub fn into_parts(self) -> (C, ExecutionRecord<W>) {
        (self.cache, self.record)
    }

    /// Resolve every model matrix, then fuse, rank and score each evaluated
    /// user.
    ///
    /// # Errors
    /// Returns [`EvaluationError`] when a predictor fails for a reason other
    /// than insufficient data, a computed matrix cannot be stored, or the
    /// execution record cannot be written. No partial metrics are returned.
    pub fn run(
        &mut self,
        predictors: &mut PredictorSet,
    ) -> Result<EvaluationReport, EvaluationError> {
        self.stage = Stage::Init;
        log::info!(
            "evaluating {} on {} ({} users, {} POIs, top_k {}, top_restricted {})",
            self.config.model_name,
            self.config.dataset_name,
            self.dataset.size().users,
            self.dataset.size().pois,
            self.config.top_k,
            self.config.top_restricted,
        );

        let (social, social_report) = self.model_stage(ModelKind::Social, predictors)?;
        let (density, density_report) = self.model_stage(ModelKind::Density, predictors)?;
        let (transition, transition_report) =
            self.model_stage(ModelKind::Transition, predictors)?;

        self.advance();
        let matrices = ModelMatrices {
            social: &social,
            density: &density,
            transition: &transition,
        };
        let snapshot = self.fuse_rank_score(&matrices)?;
        self.advance();

        log::info!(
            "finished {} users: precision@{k} {:.6}, recall@{k} {:.6}",
            snapshot.users,
            snapshot.precision,
            snapshot.recall,
            k = self.config.top_k,
        );
        Ok(EvaluationReport {
            precision: snapshot.precision,
            recall: snapshot.recall,
            users_evaluated: snapshot.users,
            cache: vec![social_report, density_report, transition_report],
            record_path: self.record.path().to_path_buf(),
        })
    }

    fn advance(&mut self) {
        self.stage = self.stage.next();
        log::debug!("entering stage {:?}", self.stage);
    }

    fn model_stage(
        &mut self,
        kind: ModelKind,
        predictors: &mut PredictorSet,
    ) -> Result<(ScoreMatrix, ModelCacheReport), EvaluationError> {
        self.advance();
        debug_assert_eq!(self.stage, Stage::PerModel(kind));

        let key = self.config.cache_key(kind);
        let outcome = match self.cache.load(&key) {
            Ok(Some(matrix)) => {
                match matrix.validate(self.dataset.size(), self.dataset.ground_truth().users()) {
                    Ok(()) => {
                        log::info!("loaded {key} from cache");
                        let report = ModelCacheReport {
                            model: kind,
                            outcome: CacheOutcome::Hit,
                        };
                        return Ok((matrix, report));
                    }
                    Err(err) => {
                        log::warn!("cached {key} does not fit the dataset ({err}); rebuilding");
                        CacheOutcome::Rebuilt
                    }
                }
            }
            Ok(None) => {
                log::info!("{key} is not cached; computing");
                CacheOutcome::Miss
            }
            Err(err) => {
                log::warn!("failed to load {key} ({err}); rebuilding");
                CacheOutcome::Rebuilt
            }
        };

        let matrix = self.compute(kind, predictors.get_mut(kind))?;
        self.cache
            .store(&key, &matrix)
            .map_err(|source| EvaluationError::CacheStore {
                key: key.to_string(),
                source,
            })?;
        Ok((
            matrix,
            ModelCacheReport {
                model: kind,
                outcome,
            },
        ))
    }

    /// Fill a matrix row for every ground-truth user.
    fn compute(
        &self,
        kind: ModelKind,
        predictor: &mut dyn Predictor,
    ) -> Result<ScoreMatrix, EvaluationError> {
        let size = self.dataset.size();
        let truth = self.dataset.ground_truth();
        let mut matrix = ScoreMatrix::new(size);

        match predictor.precompute(&self.dataset.context()) {
            Ok(()) => {}
            Err(err) if err.is_data_insufficient() => {
                log::warn!("{err}; {kind} scores default to zero");
                for user in truth.users() {
                    matrix
                        .insert_row(user, vec![0.0; size.poi_ids().len()])
                        .map_err(|source| EvaluationError::Matrix { model: kind, source })?;
                }
                return Ok(matrix);
            }
            Err(source) => return Err(EvaluationError::Predictor { model: kind, source }),
        }

        for user in truth.users() {
            let row = size
                .poi_ids()
                .map(|poi| predictor.predict(user, poi))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| EvaluationError::Predictor { model: kind, source })?;
            matrix
                .insert_row(user, row)
                .map_err(|source| EvaluationError::Matrix { model: kind, source })?;
        }
        log::debug!("{kind} matrix filled for {} users", matrix.populated_len());
        Ok(matrix)
    }

    fn fuse_rank_score(
        &mut self,
        matrices: &ModelMatrices<'_>,
    ) -> Result<MetricSnapshot, EvaluationError> {
        let dataset = self.dataset;
        let size = dataset.size();
        let top_k = self.config.top_k;
        let mut metrics = MetricAccumulator::new();

        for (cnt, user) in shuffled_users(size, self.config.seed).into_iter().enumerate() {
            let Some(actual) = dataset.ground_truth().visits(user) else {
                continue;
            };
            let scores = fuse(user, size.poi_ids(), matrices, dataset.tuples());
            let ranked = rank(&scores, self.config.top_restricted);
            let view = ranked.metric_view(top_k);
            let snapshot =
                metrics.push(precision_at_k(actual, &view), recall_at_k(actual, &view));
            log::info!(
                "{cnt} user {user}: precision@{top_k} {:.6}, recall@{top_k} {:.6}",
                snapshot.precision,
                snapshot.recall,
            );
            self.record
                .append(cnt, user, &ranked)
                .map_err(|source| self.record_error(source))?;
        }
        self.record
            .flush()
            .map_err(|source| self.record_error(source))?;
        Ok(metrics.snapshot())
    }

    fn record_error(&self, source: std::io::Error) -> EvaluationError {
        EvaluationError::Record {
            path: self.record.path().to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests;
