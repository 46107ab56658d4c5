//! Friend-based collaborative filtering.
//!
//! A user's score for a POI is the sum of their friends' visit frequencies,
//! each weighted by how similar that friend is. Similarity blends overlap of
//! friend lists and visited POIs, damped by the distance between the two
//! users' most visited locations.

use std::collections::{BTreeMap, BTreeSet};

use lore_core::{
    ModelKind, PoiCoordinates, PoiId, Predictor, PredictorError, TrainingContext, TrainingMatrix,
    UserId,
};

use crate::{SocialParams, haversine_km};

#[derive(Debug, Clone, Default)]
struct SocialState {
    neighbours: BTreeMap<UserId, Vec<(UserId, f64)>>,
    training: TrainingMatrix,
}

/// Social predictor over the friendship graph.
///
/// # Examples
/// ```
/// use lore_core::{
///     DatasetSize, PoiCoordinates, Predictor, SocialRelations, TrainingCheckins,
///     TrainingContext, TrainingMatrix,
/// };
/// use lore_scorer::{SocialParams, SocialScorer};
///
/// let training = TrainingMatrix::new().with(0, 0, 1.0).with(1, 0, 1.0).with(1, 1, 3.0);
/// let social = SocialRelations::new().with(0, 1);
/// let context = TrainingContext {
///     size: DatasetSize::new(2, 2),
///     training: &training,
///     checkins: &TrainingCheckins::default(),
///     social: &social,
///     coordinates: &PoiCoordinates::new(),
/// };
///
/// let mut scorer = SocialScorer::new(SocialParams::default());
/// scorer.precompute(&context).expect("social data present");
/// assert!(scorer.predict(0, 1).expect("precomputed") > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SocialScorer {
    params: SocialParams,
    state: Option<SocialState>,
}

impl SocialScorer {
    /// Create an unprepared scorer.
    #[must_use]
    pub const fn new(params: SocialParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    /// Configured parameters.
    #[must_use]
    pub const fn params(&self) -> SocialParams {
        self.params
    }

    /// Similarity of `friend` as seen by `user`, or `None` when not kept.
    ///
    /// Only meaningful after [`Predictor::precompute`].
    #[must_use]
    pub fn similarity(&self, user: UserId, friend: UserId) -> Option<f64> {
        self.state
            .as_ref()?
            .neighbours
            .get(&user)?
            .iter()
            .find(|(candidate, _)| *candidate == friend)
            .map(|(_, similarity)| *similarity)
    }
}

impl Predictor for SocialScorer {
    fn kind(&self) -> ModelKind {
        ModelKind::Social
    }

    fn precompute(&mut self, context: &TrainingContext<'_>) -> Result<(), PredictorError> {
        let params = self.params.validate()?;
        if context.social.is_empty() {
            self.state = Some(SocialState::default());
            return Err(PredictorError::DataInsufficient {
                model: ModelKind::Social,
                reason: "no social relations",
            });
        }

        let residences = residences(context.training);
        let empty_friends = BTreeSet::new();
        let empty_visits = BTreeSet::new();
        let visits: BTreeMap<UserId, BTreeSet<PoiId>> = context
            .training
            .users()
            .filter_map(|user| {
                context
                    .training
                    .row(user)
                    .map(|row| (user, row.keys().copied().collect()))
            })
            .collect();

        let mut neighbours = BTreeMap::new();
        for (user, friends) in context.social.iter() {
            let mut kept = Vec::new();
            for &friend in friends.iter().filter(|&&friend| friend != user) {
                let friend_overlap = jaccard(
                    friends,
                    context.social.friends(friend).unwrap_or(&empty_friends),
                );
                let visit_overlap = jaccard(
                    visits.get(&user).unwrap_or(&empty_visits),
                    visits.get(&friend).unwrap_or(&empty_visits),
                );
                let damping = proximity(
                    context.coordinates,
                    residences.get(&user).copied(),
                    residences.get(&friend).copied(),
                );
                let similarity = blend(params.eta, friend_overlap, visit_overlap) * damping;
                if similarity > 0.0 && similarity.is_finite() {
                    kept.push((friend, similarity));
                }
            }
            if !kept.is_empty() {
                neighbours.insert(user, kept);
            }
        }

        log::debug!("social model kept neighbours for {} users", neighbours.len());
        self.state = Some(SocialState {
            neighbours,
            training: context.training.clone(),
        });
        Ok(())
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "scores accumulate weighted visit frequencies"
    )]
    fn predict(&self, user: UserId, poi: PoiId) -> Result<f64, PredictorError> {
        let state = self.state.as_ref().ok_or(PredictorError::NotPrecomputed {
            model: ModelKind::Social,
        })?;
        let Some(neighbours) = state.neighbours.get(&user) else {
            return Ok(0.0);
        };
        let score = neighbours
            .iter()
            .map(|&(friend, similarity)| similarity * state.training.get(friend, poi))
            .sum();
        Ok(Self::sanitise(score))
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "similarity is a convex blend of two indices"
)]
const fn blend(eta: f64, friend_overlap: f64, visit_overlap: f64) -> f64 {
    eta * friend_overlap + (1.0 - eta) * visit_overlap
}

#[expect(clippy::float_arithmetic, reason = "distance damping is 1 / (1 + d)")]
fn proximity(coordinates: &PoiCoordinates, lhs: Option<PoiId>, rhs: Option<PoiId>) -> f64 {
    let positions = lhs
        .and_then(|poi| coordinates.get(poi))
        .zip(rhs.and_then(|poi| coordinates.get(poi)));
    positions.map_or(1.0, |(from, to)| 1.0 / (1.0 + haversine_km(from, to)))
}

/// Each user's most visited POI; ties go to the lowest identifier.
fn residences(training: &TrainingMatrix) -> BTreeMap<UserId, PoiId> {
    training
        .users()
        .filter_map(|user| {
            let row = training.row(user)?;
            let mut best: Option<(PoiId, f64)> = None;
            for (&poi, &weight) in row {
                if best.is_none_or(|(_, top)| weight > top) {
                    best = Some((poi, weight));
                }
            }
            best.map(|(poi, _)| (user, poi))
        })
        .collect()
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "Jaccard index is a ratio of set sizes"
)]
pub(crate) fn jaccard<T: Ord>(lhs: &BTreeSet<T>, rhs: &BTreeSet<T>) -> f64 {
    let shared = lhs.intersection(rhs).count();
    let union = lhs.len() + rhs.len() - shared;
    if union == 0 {
        return 0.0;
    }
    shared as f64 / union as f64
}
