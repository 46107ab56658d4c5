//! Configuration errors shared across the workspace.

use thiserror::Error;

use crate::{PoiId, UserId};

/// Fatal problems detected before any computation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// The dataset size descriptor was not two non-negative integers.
    #[error("malformed dataset size descriptor {raw:?}; expected `<users> <pois>`")]
    MalformedSize {
        /// Raw descriptor text.
        raw: String,
    },
    /// `top_k` was zero.
    #[error("top_k must be at least 1")]
    ZeroTopK,
    /// `top_k` exceeded the number of ranked entries kept per user.
    #[error("top_k ({top_k}) must not exceed top_restricted ({top_restricted})")]
    TopKExceedsRestricted {
        /// Requested metric cut-off.
        top_k: usize,
        /// Requested ranked list length.
        top_restricted: usize,
    },
    /// The sparsity ratio cannot take part in a cache key.
    #[error("sparsity ratio {ratio} must be finite")]
    NonFiniteSparsityRatio {
        /// Offending ratio.
        ratio: f64,
    },
    /// A required name was blank.
    #[error("{field} must not be empty")]
    EmptyName {
        /// Name of the blank field.
        field: &'static str,
    },
    /// A user identifier fell outside the declared user count.
    #[error("user {user} in {input} is outside the declared {users} users")]
    UserOutOfRange {
        /// Offending identifier.
        user: UserId,
        /// Declared user count.
        users: u32,
        /// Input that carried the identifier.
        input: &'static str,
    },
    /// A POI identifier fell outside the declared POI count.
    #[error("POI {poi} in {input} is outside the declared {pois} POIs")]
    PoiOutOfRange {
        /// Offending identifier.
        poi: PoiId,
        /// Declared POI count.
        pois: u32,
        /// Input that carried the identifier.
        input: &'static str,
    },
}
