//! Pre-parsed training and evaluation inputs.
//!
//! All collections use ordered maps so iteration, and therefore every score
//! derived from it, is deterministic.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Range;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::{ConfigurationError, PoiId, UserId};

/// Total user and POI counts; every matrix is sized to these.
///
/// # Examples
/// ```
/// use lore_core::DatasetSize;
///
/// let size = DatasetSize::parse("3 5\n").expect("valid descriptor");
/// assert_eq!(size, DatasetSize::new(3, 5));
/// assert_eq!(size.poi_ids().len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetSize {
    /// Number of users.
    pub users: u32,
    /// Number of points of interest.
    pub pois: u32,
}

impl DatasetSize {
    /// Construct a size from raw counts.
    #[must_use]
    pub const fn new(users: u32, pois: u32) -> Self {
        Self { users, pois }
    }

    /// Parse the first line of a `<users> <pois>` descriptor.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::MalformedSize`] unless the first line holds
    /// exactly two unsigned integers.
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let malformed = || ConfigurationError::MalformedSize {
            raw: raw.to_owned(),
        };
        let line = raw.lines().next().ok_or_else(malformed)?;
        let mut fields = line.split_whitespace();
        let (Some(users), Some(pois), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(malformed());
        };
        let users = users.parse().map_err(|_| malformed())?;
        let pois = pois.parse().map_err(|_| malformed())?;
        Ok(Self::new(users, pois))
    }

    /// Every user identifier in ascending order.
    #[must_use]
    pub const fn user_ids(self) -> Range<UserId> {
        0..self.users
    }

    /// Every POI identifier in ascending order.
    #[must_use]
    pub const fn poi_ids(self) -> Range<PoiId> {
        0..self.pois
    }

    /// Ensure `user` indexes a row of this size.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UserOutOfRange`] otherwise.
    pub fn check_user(self, user: UserId, input: &'static str) -> Result<(), ConfigurationError> {
        if user < self.users {
            Ok(())
        } else {
            Err(ConfigurationError::UserOutOfRange {
                user,
                users: self.users,
                input,
            })
        }
    }

    /// Ensure `poi` indexes a column of this size.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::PoiOutOfRange`] otherwise.
    pub fn check_poi(self, poi: PoiId, input: &'static str) -> Result<(), ConfigurationError> {
        if poi < self.pois {
            Ok(())
        } else {
            Err(ConfigurationError::PoiOutOfRange {
                poi,
                pois: self.pois,
                input,
            })
        }
    }
}

/// Observed training interactions keyed by user, then POI.
///
/// Values are check-in frequencies. Only observed pairs are stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingMatrix {
    rows: BTreeMap<UserId, BTreeMap<PoiId, f64>>,
}

impl TrainingMatrix {
    /// Create an empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `weight` for `(user, poi)`, replacing any earlier value.
    pub fn insert(&mut self, user: UserId, poi: PoiId, weight: f64) {
        self.rows.entry(user).or_default().insert(poi, weight);
    }

    /// Builder-style [`TrainingMatrix::insert`].
    #[must_use]
    pub fn with(mut self, user: UserId, poi: PoiId, weight: f64) -> Self {
        self.insert(user, poi, weight);
        self
    }

    /// Weight stored for `(user, poi)`, or `0.0` when unobserved.
    #[must_use]
    pub fn get(&self, user: UserId, poi: PoiId) -> f64 {
        self.rows
            .get(&user)
            .and_then(|row| row.get(&poi))
            .copied()
            .unwrap_or(0.0)
    }

    /// Observed POIs and weights for `user`.
    #[must_use]
    pub fn row(&self, user: UserId) -> Option<&BTreeMap<PoiId, f64>> {
        self.rows.get(&user)
    }

    /// Report whether `(user, poi)` was observed.
    #[must_use]
    pub fn contains(&self, user: UserId, poi: PoiId) -> bool {
        self.rows.get(&user).is_some_and(|row| row.contains_key(&poi))
    }

    /// Users with at least one observed interaction.
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.rows.keys().copied()
    }

    /// Iterate over every `(user, poi, weight)` triple.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, PoiId, f64)> + '_ {
        self.rows
            .iter()
            .flat_map(|(&user, row)| row.iter().map(move |(&poi, &weight)| (user, poi, weight)))
    }

    /// Number of observed pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Report whether no pair was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.values().all(BTreeMap::is_empty)
    }

    /// Materialise the exclusion set used during fusion.
    #[must_use]
    pub fn tuples(&self) -> TrainingTuples {
        TrainingTuples {
            pairs: self.iter().map(|(user, poi, _)| (user, poi)).collect(),
        }
    }
}

/// `(user, poi)` pairs already known from training; never recommended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingTuples {
    pairs: HashSet<(UserId, PoiId)>,
}

impl TrainingTuples {
    /// O(1) membership check.
    #[must_use]
    pub fn contains(&self, user: UserId, poi: PoiId) -> bool {
        self.pairs.contains(&(user, poi))
    }

    /// Number of excluded pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Report whether nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(UserId, PoiId)> for TrainingTuples {
    fn from_iter<I: IntoIterator<Item = (UserId, PoiId)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// A single timestamped visit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkin {
    /// Visited POI.
    pub poi: PoiId,
    /// Visit time in seconds since the epoch.
    pub timestamp: f64,
}

/// Per-user check-in sequences sorted ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingCheckins {
    sequences: BTreeMap<UserId, Vec<Checkin>>,
}

impl TrainingCheckins {
    /// Group raw events by user and sort each sequence by timestamp.
    ///
    /// The sort is stable, so events sharing a timestamp keep their input
    /// order.
    pub fn from_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = (UserId, Checkin)>,
    {
        let mut sequences: BTreeMap<UserId, Vec<Checkin>> = BTreeMap::new();
        for (user, checkin) in events {
            sequences.entry(user).or_default().push(checkin);
        }
        for sequence in sequences.values_mut() {
            sequence.sort_by(|lhs, rhs| lhs.timestamp.total_cmp(&rhs.timestamp));
        }
        Self { sequences }
    }

    /// Like [`TrainingCheckins::from_events`], keeping only events whose
    /// `(user, poi)` pair appears in `training`.
    pub fn from_training_events<I>(events: I, training: &TrainingMatrix) -> Self
    where
        I: IntoIterator<Item = (UserId, Checkin)>,
    {
        Self::from_events(
            events
                .into_iter()
                .filter(|(user, checkin)| training.contains(*user, checkin.poi)),
        )
    }

    /// Sorted sequence for `user`, if any.
    #[must_use]
    pub fn sequence(&self, user: UserId) -> Option<&[Checkin]> {
        self.sequences.get(&user).map(Vec::as_slice)
    }

    /// Iterate over every user's sorted sequence.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, &[Checkin])> + '_ {
        self.sequences
            .iter()
            .map(|(&user, sequence)| (user, sequence.as_slice()))
    }

    /// Report whether no check-ins were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.values().all(Vec::is_empty)
    }
}

/// Friend lists keyed by user, recorded as provided.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialRelations {
    friends: BTreeMap<UserId, BTreeSet<UserId>>,
}

impl SocialRelations {
    /// Create an empty relation set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `user` lists `friend`.
    pub fn insert(&mut self, user: UserId, friend: UserId) {
        self.friends.entry(user).or_default().insert(friend);
    }

    /// Builder-style [`SocialRelations::insert`].
    #[must_use]
    pub fn with(mut self, user: UserId, friend: UserId) -> Self {
        self.insert(user, friend);
        self
    }

    /// Friends listed by `user`.
    #[must_use]
    pub fn friends(&self, user: UserId) -> Option<&BTreeSet<UserId>> {
        self.friends.get(&user)
    }

    /// Iterate over every user's friend set.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, &BTreeSet<UserId>)> + '_ {
        self.friends.iter().map(|(&user, friends)| (user, friends))
    }

    /// Report whether no relation was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.friends.values().all(BTreeSet::is_empty)
    }
}

/// WGS84 positions keyed by POI, with `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoiCoordinates {
    positions: BTreeMap<PoiId, Coord<f64>>,
}

impl PoiCoordinates {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the position of `poi` from latitude and longitude.
    pub fn insert(&mut self, poi: PoiId, latitude: f64, longitude: f64) {
        self.positions.insert(
            poi,
            Coord {
                x: longitude,
                y: latitude,
            },
        );
    }

    /// Builder-style [`PoiCoordinates::insert`].
    #[must_use]
    pub fn with(mut self, poi: PoiId, latitude: f64, longitude: f64) -> Self {
        self.insert(poi, latitude, longitude);
        self
    }

    /// Position of `poi`, if known.
    #[must_use]
    pub fn get(&self, poi: PoiId) -> Option<Coord<f64>> {
        self.positions.get(&poi).copied()
    }

    /// Iterate over every known position.
    pub fn iter(&self) -> impl Iterator<Item = (PoiId, Coord<f64>)> + '_ {
        self.positions.iter().map(|(&poi, &coord)| (poi, coord))
    }

    /// Report whether no position is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Held-out visits per user. Only users listed here are evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundTruth {
    visits: BTreeMap<UserId, BTreeSet<PoiId>>,
}

impl GroundTruth {
    /// Create an empty ground truth.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a held-out visit.
    pub fn insert(&mut self, user: UserId, poi: PoiId) {
        self.visits.entry(user).or_default().insert(poi);
    }

    /// Builder-style [`GroundTruth::insert`].
    #[must_use]
    pub fn with(mut self, user: UserId, poi: PoiId) -> Self {
        self.insert(user, poi);
        self
    }

    /// Visits for `user`, or `None` when the user is not evaluated.
    #[must_use]
    pub fn visits(&self, user: UserId) -> Option<&BTreeSet<PoiId>> {
        self.visits.get(&user)
    }

    /// Report whether `user` is evaluated.
    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        self.visits.contains_key(&user)
    }

    /// Evaluated users in ascending order.
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.visits.keys().copied()
    }

    /// Number of evaluated users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// Report whether nobody is evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}

/// Every input one evaluation run consumes, validated against its size.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    size: DatasetSize,
    training: TrainingMatrix,
    tuples: TrainingTuples,
    checkins: TrainingCheckins,
    social: SocialRelations,
    coordinates: PoiCoordinates,
    ground_truth: GroundTruth,
}

impl Dataset {
    /// Validate identifiers against `size` and bundle the inputs.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UserOutOfRange`] or
    /// [`ConfigurationError::PoiOutOfRange`] when any input references an
    /// identifier the size descriptor does not cover.
    pub fn new(
        size: DatasetSize,
        training: TrainingMatrix,
        checkins: TrainingCheckins,
        social: SocialRelations,
        coordinates: PoiCoordinates,
        ground_truth: GroundTruth,
    ) -> Result<Self, ConfigurationError> {
        for (user, poi, _) in training.iter() {
            size.check_user(user, "training data")?;
            size.check_poi(poi, "training data")?;
        }
        for (user, sequence) in checkins.iter() {
            size.check_user(user, "check-ins")?;
            for checkin in sequence {
                size.check_poi(checkin.poi, "check-ins")?;
            }
        }
        for (user, friends) in social.iter() {
            size.check_user(user, "social relations")?;
            for &friend in friends {
                size.check_user(friend, "social relations")?;
            }
        }
        for (poi, _) in coordinates.iter() {
            size.check_poi(poi, "POI coordinates")?;
        }
        for (user, visits) in &ground_truth.visits {
            size.check_user(*user, "ground truth")?;
            for &poi in visits {
                size.check_poi(poi, "ground truth")?;
            }
        }
        let tuples = training.tuples();
        Ok(Self {
            size,
            training,
            tuples,
            checkins,
            social,
            coordinates,
            ground_truth,
        })
    }

    /// Declared user and POI counts.
    #[must_use]
    pub const fn size(&self) -> DatasetSize {
        self.size
    }

    /// Training interactions.
    #[must_use]
    pub const fn training(&self) -> &TrainingMatrix {
        &self.training
    }

    /// Exclusion set derived from the training interactions.
    #[must_use]
    pub const fn tuples(&self) -> &TrainingTuples {
        &self.tuples
    }

    /// Held-out visits.
    #[must_use]
    pub const fn ground_truth(&self) -> &GroundTruth {
        &self.ground_truth
    }

    /// Borrow the immutable inputs predictors precompute from.
    #[must_use]
    pub const fn context(&self) -> TrainingContext<'_> {
        TrainingContext {
            size: self.size,
            training: &self.training,
            checkins: &self.checkins,
            social: &self.social,
            coordinates: &self.coordinates,
        }
    }
}

/// Read-only view handed to [`Predictor::precompute`](crate::Predictor::precompute).
#[derive(Debug, Clone, Copy)]
pub struct TrainingContext<'a> {
    /// Declared user and POI counts.
    pub size: DatasetSize,
    /// Training interactions.
    pub training: &'a TrainingMatrix,
    /// Time-sorted training check-ins.
    pub checkins: &'a TrainingCheckins,
    /// Friend lists.
    pub social: &'a SocialRelations,
    /// POI positions.
    pub coordinates: &'a PoiCoordinates,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10 20", DatasetSize::new(10, 20))]
    #[case("  4\t7  \nignored", DatasetSize::new(4, 7))]
    fn size_parses_first_line(#[case] raw: &str, #[case] expected: DatasetSize) {
        assert_eq!(DatasetSize::parse(raw), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("10")]
    #[case("10 20 30")]
    #[case("ten twenty")]
    #[case("-1 3")]
    fn size_rejects_malformed_descriptors(#[case] raw: &str) {
        assert!(matches!(
            DatasetSize::parse(raw),
            Err(ConfigurationError::MalformedSize { .. })
        ));
    }

    #[rstest]
    fn checkins_sort_by_timestamp_and_keep_ties_stable() {
        let checkins = TrainingCheckins::from_events([
            (0, Checkin { poi: 3, timestamp: 30.0 }),
            (0, Checkin { poi: 1, timestamp: 10.0 }),
            (0, Checkin { poi: 4, timestamp: 10.0 }),
        ]);
        let pois: Vec<PoiId> = checkins
            .sequence(0)
            .expect("user 0 has check-ins")
            .iter()
            .map(|checkin| checkin.poi)
            .collect();
        assert_eq!(pois, vec![1, 4, 3]);
    }

    #[rstest]
    fn checkins_drop_pairs_missing_from_training() {
        let training = TrainingMatrix::new().with(0, 1, 1.0);
        let checkins = TrainingCheckins::from_training_events(
            [
                (0, Checkin { poi: 1, timestamp: 1.0 }),
                (0, Checkin { poi: 2, timestamp: 2.0 }),
                (1, Checkin { poi: 1, timestamp: 3.0 }),
            ],
            &training,
        );
        assert_eq!(checkins.sequence(0).map(<[Checkin]>::len), Some(1));
        assert!(checkins.sequence(1).is_none());
    }

    #[rstest]
    fn tuples_mirror_training_pairs() {
        let training = TrainingMatrix::new().with(0, 2, 3.0).with(1, 4, 1.0);
        let tuples = training.tuples();
        assert!(tuples.contains(0, 2));
        assert!(tuples.contains(1, 4));
        assert!(!tuples.contains(0, 4));
        assert_eq!(tuples.len(), 2);
    }

    #[rstest]
    fn dataset_rejects_out_of_range_ground_truth() {
        let err = Dataset::new(
            DatasetSize::new(2, 2),
            TrainingMatrix::new(),
            TrainingCheckins::default(),
            SocialRelations::new(),
            PoiCoordinates::new(),
            GroundTruth::new().with(0, 5),
        )
        .expect_err("POI 5 is out of range");
        assert_eq!(
            err,
            ConfigurationError::PoiOutOfRange {
                poi: 5,
                pois: 2,
                input: "ground truth",
            }
        );
    }

    #[rstest]
    fn dataset_rejects_unknown_friends() {
        let err = Dataset::new(
            DatasetSize::new(2, 2),
            TrainingMatrix::new(),
            TrainingCheckins::default(),
            SocialRelations::new().with(0, 9),
            PoiCoordinates::new(),
            GroundTruth::new(),
        )
        .expect_err("friend 9 is out of range");
        assert!(matches!(err, ConfigurationError::UserOutOfRange { user: 9, .. }));
    }
}
