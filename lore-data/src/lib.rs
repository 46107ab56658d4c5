//! Dataset loading for the LORE fusion engine.
//!
//! A dataset is a directory of tab-separated text files:
//!
//! | File                  | Columns            |
//! |-----------------------|--------------------|
//! | `dataSize.txt`        | `users pois`       |
//! | `train.txt`           | `uid lid [freq]`   |
//! | `test.txt`            | `uid lid [freq]`   |
//! | `checkins.txt`        | `uid lid timestamp`|
//! | `socialRelations.txt` | `uid fid`          |
//! | `poiCoos.txt`         | `lid lat lng`      |
//!
//! [`load_dataset`] reads them all and returns a validated
//! [`Dataset`](lore_core::Dataset).
//!
//! Boundaries:
//! - Parse and validate only; scoring lives in `lore-scorer`.
//! - Files are read through `lore-fs` so paths stay UTF-8.

#![forbid(unsafe_code)]

use lore_core::Dataset;

mod error;
mod files;
mod readers;

pub use error::DatasetError;
pub use files::{
    CHECKINS_FILE, DATA_SIZE_FILE, DatasetFiles, POI_COOS_FILE, SOCIAL_RELATIONS_FILE, TEST_FILE,
    TRAIN_FILE,
};
pub use readers::{
    DEFAULT_FREQUENCY, read_data_size, read_friend_data, read_poi_coos, read_sparse_training_data,
    read_test_data, read_training_checkins,
};

/// Read every file in `files` and assemble a validated dataset.
///
/// Check-ins are restricted to pairs present in the training data and sorted
/// per user by timestamp.
///
/// # Examples
/// ```no_run
/// use lore_data::{DatasetFiles, load_dataset};
///
/// # fn main() -> Result<(), lore_data::DatasetError> {
/// let dataset = load_dataset(&DatasetFiles::in_dir("Data/Gowalla"))?;
/// println!("{} users evaluated", dataset.ground_truth().len());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// Returns [`DatasetError`] when any file is missing, unreadable, malformed,
/// or references identifiers outside the declared size.
pub fn load_dataset(files: &DatasetFiles) -> Result<Dataset, DatasetError> {
    files.ensure_present()?;
    let size = read_data_size(&files.data_size)?;
    let training = read_sparse_training_data(&files.train, size)?;
    let checkins = read_training_checkins(&files.checkins, size, &training)?;
    let social = read_friend_data(&files.social_relations, size)?;
    let ground_truth = read_test_data(&files.test, size)?;
    let coordinates = read_poi_coos(&files.poi_coos, size)?;
    log::info!(
        "loaded dataset with {} users, {} POIs, {} training pairs and {} evaluated users",
        size.users,
        size.pois,
        training.len(),
        ground_truth.len()
    );
    Ok(Dataset::new(
        size,
        training,
        checkins,
        social,
        coordinates,
        ground_truth,
    )?)
}

#[cfg(test)]
mod tests;
