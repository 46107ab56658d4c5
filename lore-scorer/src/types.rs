//! Tuning parameters for the social and transition models.

use lore_core::{ModelKind, PredictorError};
use serde::{Deserialize, Serialize};

/// Default weight of friend-set overlap against POI overlap.
pub const DEFAULT_ETA: f64 = 0.05;

/// Default window, in seconds, within which two visits form a transition.
pub const DEFAULT_DELTA_T: f64 = 86_400.0;

/// Default decay rate applied to older visits in a sequence.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Lower bound on the kernel bandwidth in kilometres.
///
/// Users whose visits share one location would otherwise get a zero
/// bandwidth.
pub const MIN_BANDWIDTH_KM: f64 = 0.1;

/// Parameters of the friend-based collaborative filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SocialParams {
    /// Weight of the friend-set Jaccard index; the POI-set index receives
    /// `1 - eta`.
    pub eta: f64,
}

impl Default for SocialParams {
    fn default() -> Self {
        Self { eta: DEFAULT_ETA }
    }
}

impl SocialParams {
    /// Validate the parameters and return a copy.
    ///
    /// # Errors
    /// Returns [`PredictorError::InvalidParameter`] unless `eta` lies in
    /// `0.0..=1.0`.
    pub fn validate(self) -> Result<Self, PredictorError> {
        if (0.0..=1.0).contains(&self.eta) {
            Ok(self)
        } else {
            Err(PredictorError::InvalidParameter {
                model: ModelKind::Social,
                name: "eta",
                value: self.eta,
            })
        }
    }
}

/// Parameters of the additive Markov chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionParams {
    /// Maximum gap in seconds between two visits counted as a transition.
    pub delta_t: f64,
    /// Decay rate; a visit `k` steps before the latest weighs `2^(-alpha k)`.
    pub alpha: f64,
}

impl Default for TransitionParams {
    fn default() -> Self {
        Self {
            delta_t: DEFAULT_DELTA_T,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl TransitionParams {
    /// Validate the parameters and return a copy.
    ///
    /// # Errors
    /// Returns [`PredictorError::InvalidParameter`] when either value is
    /// negative or not finite.
    pub fn validate(self) -> Result<Self, PredictorError> {
        let invalid = |name, value| PredictorError::InvalidParameter {
            model: ModelKind::Transition,
            name,
            value,
        };
        if !self.delta_t.is_finite() || self.delta_t < 0.0 {
            return Err(invalid("delta_t", self.delta_t));
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(invalid("alpha", self.alpha));
        }
        Ok(self)
    }
}
