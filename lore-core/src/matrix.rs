//! Sparse user x POI score matrices.
//!
//! A [`ScoreMatrix`] stores one dense row per populated user. Rows exist only
//! for users that are evaluated; reading any other row yields zero.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DatasetSize, PoiId, UserId};

/// Scores produced by a single predictor, keyed by user.
///
/// # Examples
/// ```
/// use lore_core::{DatasetSize, ScoreMatrix};
///
/// let mut matrix = ScoreMatrix::new(DatasetSize::new(3, 2));
/// matrix.insert_row(1, vec![0.5, 0.25]).expect("row fits the shape");
/// assert_eq!(matrix.get(1, 0), 0.5);
/// assert_eq!(matrix.get(0, 0), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMatrix {
    size: DatasetSize,
    rows: BTreeMap<UserId, Vec<f64>>,
}

/// Reasons a matrix does not fit the dataset it is used with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixShapeError {
    /// The matrix was built for a different dataset size.
    #[error("matrix is sized {found:?} but the dataset is {expected:?}")]
    SizeMismatch {
        /// Size of the current dataset.
        expected: DatasetSize,
        /// Size recorded in the matrix.
        found: DatasetSize,
    },
    /// A row had the wrong number of columns.
    #[error("row for user {user} has {found} columns, expected {expected}")]
    RowLength {
        /// Row owner.
        user: UserId,
        /// Declared POI count.
        expected: usize,
        /// Columns supplied.
        found: usize,
    },
    /// A row was keyed by a user outside the declared count.
    #[error("row for user {user} is outside the declared {users} users")]
    UserOutOfRange {
        /// Row owner.
        user: UserId,
        /// Declared user count.
        users: u32,
    },
    /// A user that must be scored has no row.
    #[error("no row for evaluated user {user}")]
    MissingRow {
        /// User without a row.
        user: UserId,
    },
    /// A row exists for a user that is not evaluated.
    #[error("unexpected row for user {user}, who is not evaluated")]
    UnexpectedRow {
        /// Row owner.
        user: UserId,
    },
    /// A cell is negative, NaN or infinite.
    #[error("score for user {user} and POI {poi} is not a finite non-negative value")]
    InvalidScore {
        /// Row owner.
        user: UserId,
        /// Offending column.
        poi: PoiId,
    },
}

impl ScoreMatrix {
    /// Create an empty matrix for `size`.
    #[must_use]
    pub const fn new(size: DatasetSize) -> Self {
        Self {
            size,
            rows: BTreeMap::new(),
        }
    }

    /// Declared shape.
    #[must_use]
    pub const fn size(&self) -> DatasetSize {
        self.size
    }

    /// Store the full row for `user`.
    ///
    /// # Errors
    /// Returns [`MatrixShapeError::UserOutOfRange`] or
    /// [`MatrixShapeError::RowLength`] when the row does not fit the shape.
    pub fn insert_row(&mut self, user: UserId, row: Vec<f64>) -> Result<(), MatrixShapeError> {
        self.check_row(user, &row)?;
        self.rows.insert(user, row);
        Ok(())
    }

    /// Row for `user`, if populated.
    #[must_use]
    pub fn row(&self, user: UserId) -> Option<&[f64]> {
        self.rows.get(&user).map(Vec::as_slice)
    }

    /// Score for `(user, poi)`; unpopulated cells read as `0.0`.
    #[must_use]
    pub fn get(&self, user: UserId, poi: PoiId) -> f64 {
        let Ok(column) = usize::try_from(poi) else {
            return 0.0;
        };
        self.row(user)
            .and_then(|row| row.get(column))
            .copied()
            .unwrap_or(0.0)
    }

    /// Users with a stored row, ascending.
    pub fn populated_users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.rows.keys().copied()
    }

    /// Number of stored rows.
    #[must_use]
    pub fn populated_len(&self) -> usize {
        self.rows.len()
    }

    /// Check that the matrix fits `expected` and holds a row for exactly the
    /// users in `required`, each made of finite non-negative scores.
    ///
    /// Loaded matrices are untrusted: a stale artefact from a differently
    /// sized dataset must never be indexed, and a negative cell would rank a
    /// genuine candidate behind the training mask.
    ///
    /// # Errors
    /// Returns the first [`MatrixShapeError`] encountered.
    pub fn validate<I>(&self, expected: DatasetSize, required: I) -> Result<(), MatrixShapeError>
    where
        I: IntoIterator<Item = UserId>,
    {
        if self.size != expected {
            return Err(MatrixShapeError::SizeMismatch {
                expected,
                found: self.size,
            });
        }
        let evaluated: BTreeSet<UserId> = required.into_iter().collect();
        for (&user, row) in &self.rows {
            self.check_row(user, row)?;
            if !evaluated.contains(&user) {
                return Err(MatrixShapeError::UnexpectedRow { user });
            }
            if let Some(poi) = row
                .iter()
                .position(|score| !(score.is_finite() && *score >= 0.0))
            {
                return Err(MatrixShapeError::InvalidScore {
                    user,
                    poi: PoiId::try_from(poi).unwrap_or(PoiId::MAX),
                });
            }
        }
        evaluated
            .into_iter()
            .find(|user| !self.rows.contains_key(user))
            .map_or(Ok(()), |user| Err(MatrixShapeError::MissingRow { user }))
    }

    fn check_row(&self, user: UserId, row: &[f64]) -> Result<(), MatrixShapeError> {
        if user >= self.size.users {
            return Err(MatrixShapeError::UserOutOfRange {
                user,
                users: self.size.users,
            });
        }
        let expected = usize::try_from(self.size.pois).unwrap_or(usize::MAX);
        if row.len() != expected {
            return Err(MatrixShapeError::RowLength {
                user,
                expected,
                found: row.len(),
            });
        }
        Ok(())
    }
}
