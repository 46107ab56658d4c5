//! Multiplicative fusion of the three model scores.

use std::ops::Range;

use lore_core::{ModelKind, PoiId, ScoreMatrix, TrainingTuples, UserId};

/// Score assigned to pairs already seen in training.
///
/// Genuine fused scores are never negative, so masked candidates always rank
/// last.
pub const MASKED_SCORE: f64 = -1.0;

/// Borrowed per-model matrices for one run.
#[derive(Debug, Clone, Copy)]
pub struct ModelMatrices<'a> {
    /// Social scores.
    pub social: &'a ScoreMatrix,
    /// Density scores.
    pub density: &'a ScoreMatrix,
    /// Transition scores.
    pub transition: &'a ScoreMatrix,
}

impl<'a> ModelMatrices<'a> {
    /// Matrix produced by `kind`.
    #[must_use]
    pub const fn get(&self, kind: ModelKind) -> &'a ScoreMatrix {
        match kind {
            ModelKind::Social => self.social,
            ModelKind::Density => self.density,
            ModelKind::Transition => self.transition,
        }
    }
}

/// Fuse scores for `user` over `pois`; position `i` holds POI `pois.start + i`.
///
/// Training pairs receive [`MASKED_SCORE`]; every other pair receives the
/// product of the three model scores, unnormalised.
///
/// # Examples
/// ```
/// use lore_core::{DatasetSize, ScoreMatrix, TrainingTuples};
/// use lore_eval::{MASKED_SCORE, ModelMatrices, fuse};
///
/// let mut social = ScoreMatrix::new(DatasetSize::new(1, 3));
/// social.insert_row(0, vec![0.5, 2.0, 1.0]).expect("row fits");
/// let mut ones = ScoreMatrix::new(DatasetSize::new(1, 3));
/// ones.insert_row(0, vec![1.0; 3]).expect("row fits");
/// let matrices = ModelMatrices { social: &social, density: &ones, transition: &ones };
/// let tuples: TrainingTuples = [(0, 2)].into_iter().collect();
///
/// assert_eq!(fuse(0, 0..3, &matrices, &tuples), vec![0.5, 2.0, MASKED_SCORE]);
/// ```
#[expect(clippy::float_arithmetic, reason = "fusion multiplies model scores")]
#[must_use]
pub fn fuse(
    user: UserId,
    pois: Range<PoiId>,
    matrices: &ModelMatrices<'_>,
    tuples: &TrainingTuples,
) -> Vec<f64> {
    pois.map(|poi| {
        if tuples.contains(user, poi) {
            MASKED_SCORE
        } else {
            matrices.social.get(user, poi)
                * matrices.density.get(user, poi)
                * matrices.transition.get(user, poi)
        }
    })
    .collect()
}
