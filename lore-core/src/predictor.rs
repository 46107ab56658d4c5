//! The contract every signal model implements.
//!
//! A [`Predictor`] is prepared once from a [`TrainingContext`] and then
//! answers `(user, poi)` queries from its precomputed state. The fusion stage
//! treats the social, density, and transition models symmetrically through
//! this trait.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PoiId, TrainingContext, UserId};

/// The three signal families fused by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Friend-based collaborative filtering.
    Social,
    /// Kernel density over a user's visited locations.
    Density,
    /// Additive Markov chain over check-in sequences.
    Transition,
}

impl ModelKind {
    /// Fixed evaluation order.
    pub const ALL: [Self; 3] = [Self::Social, Self::Density, Self::Transition];

    /// Short tag used in cache keys.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Social => "FCF",
            Self::Density => "KDE",
            Self::Transition => "AMC",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Social => "social",
            Self::Density => "density",
            Self::Transition => "transition",
        };
        f.write_str(name)
    }
}

/// Errors raised by predictors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictorError {
    /// The inputs this model needs are empty.
    ///
    /// Callers treat this as a neutral contribution rather than a failure.
    #[error("{model} predictor has insufficient data: {reason}")]
    DataInsufficient {
        /// Affected model.
        model: ModelKind,
        /// What was missing.
        reason: &'static str,
    },
    /// `predict` was called before `precompute`.
    #[error("{model} predictor was queried before precompute")]
    NotPrecomputed {
        /// Affected model.
        model: ModelKind,
    },
    /// A tuning parameter cannot be used.
    #[error("{model} parameter {name} = {value} is invalid")]
    InvalidParameter {
        /// Affected model.
        model: ModelKind,
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
}

impl PredictorError {
    /// Report whether the error only means "contributes zero".
    #[must_use]
    pub const fn is_data_insufficient(&self) -> bool {
        matches!(self, Self::DataInsufficient { .. })
    }
}

/// Score `(user, poi)` pairs from one-shot precomputed state.
///
/// Implementations must:
/// - Make `precompute` idempotent; running it twice yields the same state.
/// - Return finite, non-negative scores from `predict`; higher is better and
///   there is no upper bound.
/// - Return `0.0` for users without usable data instead of failing.
/// - Be deterministic for identical state and arguments.
///
/// Use [`Predictor::sanitise`] to apply the score guards.
///
/// # Examples
///
/// ```rust
/// use lore_core::{ModelKind, PoiId, Predictor, PredictorError, TrainingContext, UserId};
///
/// struct Uniform;
///
/// impl Predictor for Uniform {
///     fn kind(&self) -> ModelKind {
///         ModelKind::Density
///     }
///
///     fn precompute(&mut self, _context: &TrainingContext<'_>) -> Result<(), PredictorError> {
///         Ok(())
///     }
///
///     fn predict(&self, _user: UserId, _poi: PoiId) -> Result<f64, PredictorError> {
///         Ok(1.0)
///     }
/// }
///
/// assert_eq!(Uniform.predict(0, 0), Ok(1.0));
/// assert_eq!(<Uniform as Predictor>::sanitise(f64::NAN), 0.0);
/// ```
pub trait Predictor: Send + Sync {
    /// Which signal family this predictor implements.
    fn kind(&self) -> ModelKind;

    /// Build internal state from the training inputs.
    ///
    /// # Errors
    /// Returns [`PredictorError::DataInsufficient`] when the inputs this model
    /// needs are empty, or [`PredictorError::InvalidParameter`] for unusable
    /// tuning values.
    fn precompute(&mut self, context: &TrainingContext<'_>) -> Result<(), PredictorError>;

    /// Score `poi` for `user`.
    ///
    /// # Errors
    /// Returns [`PredictorError::NotPrecomputed`] when called before
    /// [`Predictor::precompute`].
    fn predict(&self, user: UserId, poi: PoiId) -> Result<f64, PredictorError>;

    /// Map non-finite and negative raw scores to `0.0`.
    fn sanitise(score: f64) -> f64
    where
        Self: Sized,
    {
        if score.is_finite() { score.max(0.0) } else { 0.0 }
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn kind(&self) -> ModelKind {
        (**self).kind()
    }

    fn precompute(&mut self, context: &TrainingContext<'_>) -> Result<(), PredictorError> {
        (**self).precompute(context)
    }

    fn predict(&self, user: UserId, poi: PoiId) -> Result<f64, PredictorError> {
        (**self).predict(user, poi)
    }
}
