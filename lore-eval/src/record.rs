//! Per-run execution record of ranked lists.
//!
//! Each evaluated user produces one tab-separated line:
//! `cnt \t user \t comma-joined ranked POIs`, where `cnt` is the user's
//! position in the shuffled evaluation order.

use std::io::{self, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use lore_core::UserId;
use lore_fs::create_utf8_file;

use crate::RankedList;

/// Append-only log owned by one evaluation run.
#[derive(Debug)]
pub struct ExecutionRecord<W: Write = BufWriter<fs_utf8::File>> {
    path: Utf8PathBuf,
    writer: W,
}

impl ExecutionRecord {
    /// Create (or truncate) the record for a run inside `dir`.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the directory or file cannot be
    /// created.
    pub fn create(
        dir: &Utf8Path,
        model_name: &str,
        dataset_name: &str,
        top_restricted: usize,
    ) -> io::Result<Self> {
        let path = dir.join(Self::file_name(model_name, dataset_name, top_restricted));
        let file = create_utf8_file(&path)?;
        log::debug!("writing execution record to {path}");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }
}

impl<W: Write> ExecutionRecord<W> {
    /// Wrap an arbitrary writer, reporting `path` as its location.
    #[must_use]
    pub fn from_writer(path: impl Into<Utf8PathBuf>, writer: W) -> Self {
        Self {
            path: path.into(),
            writer,
        }
    }

    /// File name of the record for one run.
    ///
    /// The sparsity ratio is not part of the name, so runs that differ only in
    /// sparsity overwrite each other's record.
    ///
    /// # Examples
    /// ```
    /// use lore_eval::ExecutionRecord;
    ///
    /// assert_eq!(
    ///     ExecutionRecord::<Vec<u8>>::file_name("LORE", "Gowalla", 100),
    ///     "LORE_Gowalla_top100.txt",
    /// );
    /// ```
    #[must_use]
    pub fn file_name(model_name: &str, dataset_name: &str, top_restricted: usize) -> String {
        format!("{model_name}_{dataset_name}_top{top_restricted}.txt")
    }

    /// Append the line for one evaluated user.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the line cannot be written.
    pub fn append(&mut self, cnt: usize, user: UserId, ranked: &RankedList) -> io::Result<()> {
        writeln!(self.writer, "{cnt}\t{user}\t{ranked}")
    }

    /// Flush buffered lines to the underlying writer.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Location of the record.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Underlying writer.
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.writer
    }
}
