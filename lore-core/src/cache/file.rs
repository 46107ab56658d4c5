//! File-backed score matrix cache.
//!
//! Each entry lives in `{root}/{key}.lsm`: a four byte `LRSM` magic, a
//! little-endian `u16` format version, then a `bincode` payload holding the
//! key string and the matrix.

use std::io::{self, Read, Write};

use bincode::{deserialize_from, serialize_into};
use camino::{Utf8Path, Utf8PathBuf};
use lore_fs::{create_utf8_file, open_utf8_file};
use serde::{Deserialize, Serialize};

use super::{CacheError, CacheKey, ScoreMatrixCache};
use crate::ScoreMatrix;

/// File identifier for cached score matrices.
pub(crate) const SCORE_MATRIX_MAGIC: [u8; 4] = *b"LRSM";

/// Supported version of the cache file format.
pub(crate) const SCORE_MATRIX_VERSION: u16 = 1;

const EXTENSION: &str = "lsm";

#[derive(Serialize)]
struct CacheFileRef<'a> {
    magic: [u8; 4],
    version: u16,
    key: &'a str,
    matrix: &'a ScoreMatrix,
}

#[derive(Deserialize)]
struct CacheEntry {
    key: String,
    matrix: ScoreMatrix,
}

/// Stores one file per [`CacheKey`] beneath a root directory.
///
/// # Examples
/// ```
/// use lore_core::{CacheKey, FileScoreCache, ModelKind};
///
/// let cache = FileScoreCache::new("Generated/Models");
/// let key = CacheKey::new("LORE", "Gowalla", ModelKind::Social, 1.0);
/// assert_eq!(cache.path_for(&key), "Generated/Models/LORE_Gowalla_FCF_1.lsm");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScoreCache {
    root: Utf8PathBuf,
}

impl FileScoreCache {
    /// Cache rooted at `root`. The directory is created on first store.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the cache files.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Location of the entry for `key`.
    #[must_use]
    pub fn path_for(&self, key: &CacheKey) -> Utf8PathBuf {
        self.root.join(format!("{key}.{EXTENSION}"))
    }
}

impl ScoreMatrixCache for FileScoreCache {
    fn load(&self, key: &CacheKey) -> Result<Option<ScoreMatrix>, CacheError> {
        let path = self.path_for(key);
        let mut file = match open_utf8_file(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        read_entry(&mut file, &path, key).map(Some)
    }

    fn store(&mut self, key: &CacheKey, matrix: &ScoreMatrix) -> Result<(), CacheError> {
        let path = self.path_for(key);
        let mut file = create_utf8_file(&path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        let name = key.to_string();
        let payload = CacheFileRef {
            magic: SCORE_MATRIX_MAGIC,
            version: SCORE_MATRIX_VERSION,
            key: &name,
            matrix,
        };
        serialize_into(&mut file, &payload).map_err(|source| CacheError::Encode {
            path: path.clone(),
            source,
        })?;
        file.flush()
            .and_then(|()| file.sync_all())
            .map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })?;
        log::debug!("stored {} scored users under {path}", matrix.populated_len());
        Ok(())
    }
}

fn read_entry<R: Read>(
    reader: &mut R,
    path: &Utf8Path,
    key: &CacheKey,
) -> Result<ScoreMatrix, CacheError> {
    let io_error = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut magic = [0_u8; 4];
    reader.read_exact(&mut magic).map_err(io_error)?;
    if magic != SCORE_MATRIX_MAGIC {
        return Err(CacheError::InvalidMagic {
            path: path.to_path_buf(),
            expected: SCORE_MATRIX_MAGIC,
            found: magic,
        });
    }

    let mut version_bytes = [0_u8; 2];
    reader.read_exact(&mut version_bytes).map_err(io_error)?;
    let version = u16::from_le_bytes(version_bytes);
    if version != SCORE_MATRIX_VERSION {
        return Err(CacheError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: version,
            supported: SCORE_MATRIX_VERSION,
        });
    }

    let entry: CacheEntry = deserialize_from(reader).map_err(|source| CacheError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let expected = key.to_string();
    if entry.key != expected {
        return Err(CacheError::ForeignEntry {
            path: path.to_path_buf(),
            expected,
            found: entry.key,
        });
    }
    Ok(entry.matrix)
}
