//! Test-only cache and predictor doubles used by unit and behaviour tests.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    CacheError, CacheKey, ModelKind, PoiId, Predictor, PredictorError, ScoreMatrix,
    ScoreMatrixCache, TrainingContext, UserId,
};

/// In-memory [`ScoreMatrixCache`] that counts requests.
///
/// Loads and stores can be made to fail to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: BTreeMap<String, ScoreMatrix>,
    loads: Cell<usize>,
    stores: usize,
    failing_loads: bool,
    failing_stores: bool,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate `key` without counting a store.
    pub fn with_entry(mut self, key: &CacheKey, matrix: ScoreMatrix) -> Self {
        self.entries.insert(key.to_string(), matrix);
        self
    }

    /// Make every subsequent load fail.
    pub fn failing_loads(mut self) -> Self {
        self.failing_loads = true;
        self
    }

    /// Make every subsequent store fail.
    pub fn failing_stores(mut self) -> Self {
        self.failing_stores = true;
        self
    }

    /// Number of `load` calls so far.
    pub fn loads(&self) -> usize {
        self.loads.get()
    }

    /// Number of successful `store` calls so far.
    pub fn stores(&self) -> usize {
        self.stores
    }

    /// Stored matrix for `key`, if any.
    pub fn entry(&self, key: &CacheKey) -> Option<&ScoreMatrix> {
        self.entries.get(&key.to_string())
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Report whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ScoreMatrixCache for MemoryCache {
    fn load(&self, key: &CacheKey) -> Result<Option<ScoreMatrix>, CacheError> {
        self.loads.set(self.loads.get() + 1);
        if self.failing_loads {
            return Err(CacheError::Unavailable {
                key: key.to_string(),
            });
        }
        Ok(self.entries.get(&key.to_string()).cloned())
    }

    fn store(&mut self, key: &CacheKey, matrix: &ScoreMatrix) -> Result<(), CacheError> {
        if self.failing_stores {
            return Err(CacheError::Unavailable {
                key: key.to_string(),
            });
        }
        self.stores += 1;
        self.entries.insert(key.to_string(), matrix.clone());
        Ok(())
    }
}

/// Predictor answering from a fixed score table.
///
/// Pairs absent from the table score `default`. Calls are counted so tests can
/// assert that cached matrices skip recomputation.
#[derive(Debug)]
pub struct FixedPredictor {
    kind: ModelKind,
    scores: BTreeMap<(UserId, PoiId), f64>,
    default: f64,
    insufficient: bool,
    precomputed: bool,
    precomputes: AtomicUsize,
    predictions: AtomicUsize,
}

impl FixedPredictor {
    /// Predictor of `kind` scoring every pair as `default`.
    pub fn new(kind: ModelKind, default: f64) -> Self {
        Self {
            kind,
            scores: BTreeMap::new(),
            default,
            insufficient: false,
            precomputed: false,
            precomputes: AtomicUsize::new(0),
            predictions: AtomicUsize::new(0),
        }
    }

    /// Override the score for `(user, poi)`.
    pub fn with_score(mut self, user: UserId, poi: PoiId, score: f64) -> Self {
        self.scores.insert((user, poi), score);
        self
    }

    /// Make `precompute` report insufficient data.
    pub fn insufficient(mut self) -> Self {
        self.insufficient = true;
        self
    }

    /// Number of `precompute` calls so far.
    pub fn precomputes(&self) -> usize {
        self.precomputes.load(Ordering::Relaxed)
    }

    /// Number of `predict` calls so far.
    pub fn predictions(&self) -> usize {
        self.predictions.load(Ordering::Relaxed)
    }
}

impl Predictor for FixedPredictor {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn precompute(&mut self, _context: &TrainingContext<'_>) -> Result<(), PredictorError> {
        self.precomputes.fetch_add(1, Ordering::Relaxed);
        if self.insufficient {
            return Err(PredictorError::DataInsufficient {
                model: self.kind,
                reason: "fixture marked insufficient",
            });
        }
        self.precomputed = true;
        Ok(())
    }

    fn predict(&self, user: UserId, poi: PoiId) -> Result<f64, PredictorError> {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        if !self.precomputed {
            return Err(PredictorError::NotPrecomputed { model: self.kind });
        }
        Ok(self.scores.get(&(user, poi)).copied().unwrap_or(self.default))
    }
}
