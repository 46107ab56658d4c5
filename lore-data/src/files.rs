//! Locations of the files that make up one dataset.

use camino::{Utf8Path, Utf8PathBuf};
use lore_fs::file_is_file;

use crate::DatasetError;

/// Default file name of the size descriptor.
pub const DATA_SIZE_FILE: &str = "dataSize.txt";
/// Default file name of the training interactions.
pub const TRAIN_FILE: &str = "train.txt";
/// Default file name of the held-out interactions.
pub const TEST_FILE: &str = "test.txt";
/// Default file name of the timestamped check-ins.
pub const CHECKINS_FILE: &str = "checkins.txt";
/// Default file name of the friendship list.
pub const SOCIAL_RELATIONS_FILE: &str = "socialRelations.txt";
/// Default file name of the POI coordinates.
pub const POI_COOS_FILE: &str = "poiCoos.txt";

/// Paths to every input file of a dataset.
///
/// # Examples
/// ```
/// use lore_data::DatasetFiles;
///
/// let files = DatasetFiles::in_dir("Data/Gowalla");
/// assert_eq!(files.train, "Data/Gowalla/train.txt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFiles {
    /// `<users> <pois>` descriptor.
    pub data_size: Utf8PathBuf,
    /// `uid lid [freq]` training interactions.
    pub train: Utf8PathBuf,
    /// `uid lid [freq]` held-out interactions.
    pub test: Utf8PathBuf,
    /// `uid lid timestamp` check-ins.
    pub checkins: Utf8PathBuf,
    /// `uid fid` friendships.
    pub social_relations: Utf8PathBuf,
    /// `lid lat lng` coordinates.
    pub poi_coos: Utf8PathBuf,
}

impl DatasetFiles {
    /// Resolve the default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Utf8Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            data_size: dir.join(DATA_SIZE_FILE),
            train: dir.join(TRAIN_FILE),
            test: dir.join(TEST_FILE),
            checkins: dir.join(CHECKINS_FILE),
            social_relations: dir.join(SOCIAL_RELATIONS_FILE),
            poi_coos: dir.join(POI_COOS_FILE),
        }
    }

    /// Every path, in reading order.
    #[must_use]
    pub fn paths(&self) -> [&Utf8Path; 6] {
        [
            self.data_size.as_path(),
            self.train.as_path(),
            self.test.as_path(),
            self.checkins.as_path(),
            self.social_relations.as_path(),
            self.poi_coos.as_path(),
        ]
    }

    /// Ensure every file exists before any reading starts.
    ///
    /// # Errors
    /// Returns [`DatasetError::MissingFile`] for the first absent file, or
    /// [`DatasetError::Io`] when a file cannot be inspected.
    pub fn ensure_present(&self) -> Result<(), DatasetError> {
        for path in self.paths() {
            match file_is_file(path) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(DatasetError::MissingFile {
                        path: path.to_path_buf(),
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    return Err(DatasetError::MissingFile {
                        path: path.to_path_buf(),
                    });
                }
                Err(source) => {
                    return Err(DatasetError::Io {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}
