//! Signal models for the LORE fusion engine.
//!
//! The crate implements the three [`Predictor`](lore_core::Predictor)s whose
//! scores are multiplied during fusion:
//! - [`SocialScorer`] weighs friends' visits by friendship and co-visit
//!   overlap, damped by the distance between home locations.
//! - [`DensityScorer`] fits a Gaussian kernel density to each user's visited
//!   locations.
//! - [`TransitionScorer`] runs an additive Markov chain over time-ordered
//!   check-ins.
//!
//! Every scorer is prepared once with
//! [`Predictor::precompute`](lore_core::Predictor::precompute) and then
//! answers queries from immutable state. Users without usable data score
//! `0.0`.
//!
//! # Examples
//!
//! ```
//! use lore_core::{
//!     Checkin, DatasetSize, PoiCoordinates, Predictor, SocialRelations, TrainingCheckins,
//!     TrainingContext, TrainingMatrix,
//! };
//! use lore_scorer::{TransitionParams, TransitionScorer};
//!
//! let checkins = TrainingCheckins::from_events([
//!     (0, Checkin { poi: 0, timestamp: 0.0 }),
//!     (0, Checkin { poi: 1, timestamp: 60.0 }),
//! ]);
//! let context = TrainingContext {
//!     size: DatasetSize::new(1, 2),
//!     training: &TrainingMatrix::new(),
//!     checkins: &checkins,
//!     social: &SocialRelations::new(),
//!     coordinates: &PoiCoordinates::new(),
//! };
//! let mut scorer = TransitionScorer::new(TransitionParams::default());
//! scorer.precompute(&context).expect("check-ins present");
//! assert_eq!(scorer.transition_probability(0, 1), 1.0);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use geo::{Coord, Distance, Haversine, Point};

mod density;
mod social;
mod transition;
mod types;

pub use density::DensityScorer;
pub use social::SocialScorer;
pub use transition::TransitionScorer;
pub use types::{
    DEFAULT_ALPHA, DEFAULT_DELTA_T, DEFAULT_ETA, MIN_BANDWIDTH_KM, SocialParams, TransitionParams,
};

const METRES_PER_KILOMETRE: f64 = 1_000.0;

/// Great-circle distance in kilometres between two `(lng, lat)` positions.
#[expect(clippy::float_arithmetic, reason = "unit conversion")]
pub(crate) fn haversine_km(from: Coord<f64>, to: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(from), Point::from(to)) / METRES_PER_KILOMETRE
}

#[cfg(test)]
mod tests;
