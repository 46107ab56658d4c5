//! Tab-separated readers for the individual dataset files.
//!
//! Every reader range-checks identifiers against the [`DatasetSize`] so a
//! stray row fails at load time instead of indexing out of bounds later.

use std::io::Read;

use camino::Utf8Path;
use csv::{ReaderBuilder, Trim};
use lore_core::{
    Checkin, ConfigurationError, DatasetSize, GroundTruth, PoiCoordinates, PoiId,
    SocialRelations, TrainingCheckins, TrainingMatrix, UserId,
};
use lore_fs::open_utf8_file;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::DatasetError;

/// Frequency assumed when an interaction row omits it.
pub const DEFAULT_FREQUENCY: f64 = 1.0;

#[derive(Debug, Deserialize)]
struct InteractionRecord {
    user: UserId,
    poi: PoiId,
    #[serde(default)]
    frequency: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CheckinRecord {
    user: UserId,
    poi: PoiId,
    timestamp: f64,
}

#[derive(Debug, Deserialize)]
struct FriendshipRecord {
    user: UserId,
    friend: UserId,
}

#[derive(Debug, Deserialize)]
struct CoordinateRecord {
    poi: PoiId,
    latitude: f64,
    longitude: f64,
}

fn read_records<T: DeserializeOwned>(path: &Utf8Path) -> Result<Vec<T>, DatasetError> {
    let file = open_utf8_file(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(file, path)
}

fn parse_records<T, R>(reader: R, path: &Utf8Path) -> Result<Vec<T>, DatasetError>
where
    T: DeserializeOwned,
    R: Read,
{
    ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
        .into_deserialize()
        .map(|record| {
            record.map_err(|source| DatasetError::Parse {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

fn invalid(path: &Utf8Path) -> impl Fn(ConfigurationError) -> DatasetError + '_ {
    move |source| DatasetError::Invalid {
        path: path.to_path_buf(),
        source,
    }
}

/// Read the `<users> <pois>` descriptor.
///
/// # Errors
/// Returns [`DatasetError::Io`] when the file cannot be read, or
/// [`DatasetError::Invalid`] when its first line is malformed.
pub fn read_data_size(path: &Utf8Path) -> Result<DatasetSize, DatasetError> {
    let mut raw = String::new();
    open_utf8_file(path)
        .and_then(|mut file| file.read_to_string(&mut raw))
        .map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    DatasetSize::parse(&raw).map_err(invalid(path))
}

/// Read `uid lid [freq]` training rows into a sparse matrix.
///
/// Missing frequencies default to [`DEFAULT_FREQUENCY`]. A repeated pair keeps
/// the last value read.
///
/// # Errors
/// Returns [`DatasetError`] when the file cannot be read or parsed, or when a
/// row references an identifier outside `size`.
pub fn read_sparse_training_data(
    path: &Utf8Path,
    size: DatasetSize,
) -> Result<TrainingMatrix, DatasetError> {
    let mut matrix = TrainingMatrix::new();
    for record in read_records::<InteractionRecord>(path)? {
        size.check_user(record.user, "training data")
            .and_then(|()| size.check_poi(record.poi, "training data"))
            .map_err(invalid(path))?;
        matrix.insert(
            record.user,
            record.poi,
            record.frequency.unwrap_or(DEFAULT_FREQUENCY),
        );
    }
    Ok(matrix)
}

/// Read `uid lid timestamp` rows, keeping only pairs seen in `training`.
///
/// Each user's check-ins are sorted by timestamp; ties keep file order.
///
/// # Errors
/// Returns [`DatasetError`] when the file cannot be read or parsed, or when a
/// row references an identifier outside `size`.
pub fn read_training_checkins(
    path: &Utf8Path,
    size: DatasetSize,
    training: &TrainingMatrix,
) -> Result<TrainingCheckins, DatasetError> {
    let records = read_records::<CheckinRecord>(path)?;
    let mut events = Vec::with_capacity(records.len());
    for record in records {
        size.check_user(record.user, "check-ins")
            .and_then(|()| size.check_poi(record.poi, "check-ins"))
            .map_err(invalid(path))?;
        events.push((
            record.user,
            Checkin {
                poi: record.poi,
                timestamp: record.timestamp,
            },
        ));
    }
    Ok(TrainingCheckins::from_training_events(events, training))
}

/// Read `uid fid` friendship rows as listed.
///
/// # Errors
/// Returns [`DatasetError`] when the file cannot be read or parsed, or when a
/// row references a user outside `size`.
pub fn read_friend_data(
    path: &Utf8Path,
    size: DatasetSize,
) -> Result<SocialRelations, DatasetError> {
    let mut social = SocialRelations::new();
    for record in read_records::<FriendshipRecord>(path)? {
        size.check_user(record.user, "social relations")
            .and_then(|()| size.check_user(record.friend, "social relations"))
            .map_err(invalid(path))?;
        social.insert(record.user, record.friend);
    }
    Ok(social)
}

/// Read `uid lid [freq]` held-out rows; frequencies are ignored.
///
/// # Errors
/// Returns [`DatasetError`] when the file cannot be read or parsed, or when a
/// row references an identifier outside `size`.
pub fn read_test_data(path: &Utf8Path, size: DatasetSize) -> Result<GroundTruth, DatasetError> {
    let mut truth = GroundTruth::new();
    for record in read_records::<InteractionRecord>(path)? {
        size.check_user(record.user, "ground truth")
            .and_then(|()| size.check_poi(record.poi, "ground truth"))
            .map_err(invalid(path))?;
        truth.insert(record.user, record.poi);
    }
    Ok(truth)
}

/// Read `lid lat lng` rows.
///
/// # Errors
/// Returns [`DatasetError`] when the file cannot be read or parsed, or when a
/// row references a POI outside `size`.
pub fn read_poi_coos(path: &Utf8Path, size: DatasetSize) -> Result<PoiCoordinates, DatasetError> {
    let mut coordinates = PoiCoordinates::new();
    for record in read_records::<CoordinateRecord>(path)? {
        size.check_poi(record.poi, "POI coordinates")
            .map_err(invalid(path))?;
        coordinates.insert(record.poi, record.latitude, record.longitude);
    }
    Ok(coordinates)
}
