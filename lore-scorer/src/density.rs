//! Per-user kernel density over visited locations.
//!
//! Each user's visits form a weighted sample of positions. The score of a POI
//! is the Gaussian kernel density of that sample at the POI's position, with
//! a bandwidth chosen by Silverman's rule of thumb.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use geo::Coord;
use lore_core::{
    ModelKind, PoiCoordinates, PoiId, Predictor, PredictorError, TrainingContext, UserId,
};

use crate::{MIN_BANDWIDTH_KM, haversine_km};

#[derive(Debug, Clone, PartialEq)]
struct UserKernel {
    samples: Vec<(Coord<f64>, f64)>,
    total_weight: f64,
    bandwidth: f64,
}

#[derive(Debug, Clone, Default)]
struct DensityState {
    kernels: BTreeMap<UserId, UserKernel>,
    coordinates: PoiCoordinates,
}

/// Geographical predictor based on two-dimensional kernel density.
#[derive(Debug, Clone, Default)]
pub struct DensityScorer {
    state: Option<DensityState>,
}

impl DensityScorer {
    /// Create an unprepared scorer.
    #[must_use]
    pub const fn new() -> Self {
        Self { state: None }
    }

    /// Kernel bandwidth in kilometres chosen for `user`, if they have a
    /// located visit.
    #[must_use]
    pub fn bandwidth(&self, user: UserId) -> Option<f64> {
        self.state
            .as_ref()?
            .kernels
            .get(&user)
            .map(|kernel| kernel.bandwidth)
    }
}

impl Predictor for DensityScorer {
    fn kind(&self) -> ModelKind {
        ModelKind::Density
    }

    fn precompute(&mut self, context: &TrainingContext<'_>) -> Result<(), PredictorError> {
        if context.training.is_empty() {
            self.state = Some(DensityState::default());
            return Err(PredictorError::DataInsufficient {
                model: ModelKind::Density,
                reason: "no training check-ins",
            });
        }

        let mut kernels = BTreeMap::new();
        for user in context.training.users() {
            let samples: Vec<(Coord<f64>, f64)> = context
                .training
                .row(user)
                .into_iter()
                .flatten()
                .filter(|&(_, &weight)| weight.is_finite() && weight > 0.0)
                .filter_map(|(&poi, &weight)| {
                    context.coordinates.get(poi).map(|coord| (coord, weight))
                })
                .collect();
            if let Some(kernel) = UserKernel::fit(samples) {
                kernels.insert(user, kernel);
            }
        }

        if kernels.is_empty() {
            log::warn!("density model found no located training visits");
        }
        self.state = Some(DensityState {
            kernels,
            coordinates: context.coordinates.clone(),
        });
        Ok(())
    }

    fn predict(&self, user: UserId, poi: PoiId) -> Result<f64, PredictorError> {
        let state = self.state.as_ref().ok_or(PredictorError::NotPrecomputed {
            model: ModelKind::Density,
        })?;
        let (Some(kernel), Some(position)) = (state.kernels.get(&user), state.coordinates.get(poi))
        else {
            return Ok(0.0);
        };
        Ok(Self::sanitise(kernel.density_at(position)))
    }
}

impl UserKernel {
    #[expect(
        clippy::float_arithmetic,
        reason = "bandwidth selection uses weighted moments"
    )]
    fn fit(samples: Vec<(Coord<f64>, f64)>) -> Option<Self> {
        let total_weight: f64 = samples.iter().map(|(_, weight)| weight).sum();
        if samples.is_empty() || total_weight <= 0.0 {
            return None;
        }

        let centroid = Coord {
            x: samples.iter().map(|(coord, weight)| coord.x * weight).sum::<f64>() / total_weight,
            y: samples.iter().map(|(coord, weight)| coord.y * weight).sum::<f64>() / total_weight,
        };
        let variance = samples
            .iter()
            .map(|&(coord, weight)| weight * haversine_km(coord, centroid).powi(2))
            .sum::<f64>()
            / total_weight;
        let bandwidth = silverman_bandwidth(variance.sqrt(), total_weight);

        Some(Self {
            samples,
            total_weight,
            bandwidth,
        })
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "kernel density is a normalised weighted sum"
    )]
    fn density_at(&self, position: Coord<f64>) -> f64 {
        let h = self.bandwidth;
        let mass: f64 = self
            .samples
            .iter()
            .map(|&(coord, weight)| weight * gaussian(haversine_km(coord, position) / h))
            .sum();
        mass / (self.total_weight * h * h)
    }
}

/// Silverman's rule for a Gaussian kernel, floored at [`MIN_BANDWIDTH_KM`].
#[expect(
    clippy::float_arithmetic,
    reason = "Silverman's rule scales spread by sample size"
)]
pub(crate) fn silverman_bandwidth(spread_km: f64, sample_weight: f64) -> f64 {
    let h = 1.06 * spread_km * sample_weight.powf(-0.2);
    if h.is_finite() {
        h.max(MIN_BANDWIDTH_KM)
    } else {
        MIN_BANDWIDTH_KM
    }
}

/// Standard bivariate Gaussian kernel evaluated at distance `x`.
#[expect(clippy::float_arithmetic, reason = "kernel evaluation")]
fn gaussian(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI)
}
