//! Additive Markov chain over check-in sequences.
//!
//! Visits close enough in time form transitions between POIs. A user's score
//! for a candidate sums the transition probability from each POI in their
//! history, with recent visits weighing more.

use std::collections::BTreeMap;

use lore_core::{ModelKind, PoiId, Predictor, PredictorError, TrainingContext, UserId};

use crate::TransitionParams;

type TransitionTable = BTreeMap<PoiId, BTreeMap<PoiId, f64>>;

#[derive(Debug, Clone, Default)]
struct TransitionState {
    probabilities: TransitionTable,
    histories: BTreeMap<UserId, Vec<PoiId>>,
    decay: f64,
}

/// Sequential predictor based on POI-to-POI transitions.
#[derive(Debug, Clone, Default)]
pub struct TransitionScorer {
    params: TransitionParams,
    state: Option<TransitionState>,
}

impl TransitionScorer {
    /// Create an unprepared scorer.
    #[must_use]
    pub const fn new(params: TransitionParams) -> Self {
        Self {
            params,
            state: None,
        }
    }

    /// Configured parameters.
    #[must_use]
    pub const fn params(&self) -> TransitionParams {
        self.params
    }

    /// Probability of moving from `from` to `to`, once prepared.
    #[must_use]
    pub fn transition_probability(&self, from: PoiId, to: PoiId) -> f64 {
        self.state
            .as_ref()
            .and_then(|state| state.probabilities.get(&from))
            .and_then(|row| row.get(&to))
            .copied()
            .unwrap_or(0.0)
    }
}

impl Predictor for TransitionScorer {
    fn kind(&self) -> ModelKind {
        ModelKind::Transition
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "transition counts are accumulated and normalised"
    )]
    fn precompute(&mut self, context: &TrainingContext<'_>) -> Result<(), PredictorError> {
        let params = self.params.validate()?;
        let decay = (-params.alpha).exp2();
        if context.checkins.is_empty() {
            self.state = Some(TransitionState {
                decay,
                ..TransitionState::default()
            });
            return Err(PredictorError::DataInsufficient {
                model: ModelKind::Transition,
                reason: "no check-ins",
            });
        }

        let mut counts = TransitionTable::new();
        let mut histories = BTreeMap::new();
        for (user, sequence) in context.checkins.iter() {
            for pair in sequence.windows(2) {
                let [from, to] = pair else { continue };
                if to.timestamp - from.timestamp <= params.delta_t {
                    *counts
                        .entry(from.poi)
                        .or_default()
                        .entry(to.poi)
                        .or_insert(0.0) += 1.0;
                }
            }
            histories.insert(user, sequence.iter().map(|checkin| checkin.poi).collect());
        }

        for row in counts.values_mut() {
            let out_degree: f64 = row.values().sum();
            for count in row.values_mut() {
                *count /= out_degree;
            }
        }

        log::debug!("transition model saw {} source POIs", counts.len());
        self.state = Some(TransitionState {
            probabilities: counts,
            histories,
            decay,
        });
        Ok(())
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "scores are decay-weighted averages"
    )]
    fn predict(&self, user: UserId, poi: PoiId) -> Result<f64, PredictorError> {
        let state = self.state.as_ref().ok_or(PredictorError::NotPrecomputed {
            model: ModelKind::Transition,
        })?;
        let Some(history) = state.histories.get(&user) else {
            return Ok(0.0);
        };

        // The latest visit weighs 1; each earlier one is scaled by `decay`.
        let mut weight = 1.0;
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for &visited in history.iter().rev() {
            let probability = state
                .probabilities
                .get(&visited)
                .and_then(|row| row.get(&poi))
                .copied()
                .unwrap_or(0.0);
            numerator += probability * weight;
            denominator += weight;
            weight *= state.decay;
        }
        if denominator <= 0.0 {
            return Ok(0.0);
        }
        Ok(Self::sanitise(numerator / denominator))
    }
}
