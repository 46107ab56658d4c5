//! Precision and recall at a cut-off, averaged over evaluated users.

use std::collections::BTreeSet;

use lore_core::PoiId;
use serde::Serialize;

/// Fraction of the metric view found in `actual`; `0.0` for an empty view.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use lore_eval::precision_at_k;
///
/// let actual = BTreeSet::from([1, 4]);
/// assert_eq!(precision_at_k(&actual, &[4, 2]), 0.5);
/// ```
#[must_use]
pub fn precision_at_k(actual: &BTreeSet<PoiId>, view: &[PoiId]) -> f64 {
    ratio(hits(actual, view), view.len())
}

/// Fraction of `actual` found in the metric view; `0.0` when `actual` is
/// empty.
#[must_use]
pub fn recall_at_k(actual: &BTreeSet<PoiId>, view: &[PoiId]) -> f64 {
    ratio(hits(actual, view), actual.len())
}

fn hits(actual: &BTreeSet<PoiId>, view: &[PoiId]) -> usize {
    view.iter().filter(|poi| actual.contains(poi)).count()
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "metric counts are bounded by the POI count, far below 2^52"
)]
const fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Mean kept as an exact `sum / count`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    sum: f64,
    count: u32,
}

impl RunningMean {
    /// Add one observation.
    #[expect(clippy::float_arithmetic, reason = "accumulating a sum")]
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count = self.count.saturating_add(1);
    }

    /// Mean of every observation, or `0.0` before the first.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "mean is sum over count")]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / f64::from(self.count)
        }
    }

    /// Number of observations.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }
}

/// Metric means after some number of users.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSnapshot {
    /// Mean precision@K.
    pub precision: f64,
    /// Mean recall@K.
    pub recall: f64,
    /// Users evaluated so far.
    pub users: u32,
}

/// Running precision and recall over evaluated users.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricAccumulator {
    precision: RunningMean,
    recall: RunningMean,
}

impl MetricAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one user's metrics and return the updated means.
    pub fn push(&mut self, precision: f64, recall: f64) -> MetricSnapshot {
        self.precision.push(precision);
        self.recall.push(recall);
        self.snapshot()
    }

    /// Current means.
    #[must_use]
    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            precision: self.precision.mean(),
            recall: self.recall.mean(),
            users: self.precision.count(),
        }
    }
}
