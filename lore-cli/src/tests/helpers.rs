//! Test helpers that lay out a small dataset on disk.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

use super::evaluate::EvaluateArgs;

/// Three users and five POIs around central Berlin.
const DATASET: [(&str, &str); 6] = [
    ("dataSize.txt", "3\t5\n"),
    ("train.txt", "0\t2\t1\n1\t0\t2\n1\t1\t1\n2\t3\t1\n"),
    ("test.txt", "0\t4\n1\t3\t2\n"),
    ("checkins.txt", "0\t2\t100.0\n1\t0\t100.0\n1\t1\t200.0\n2\t3\t50.0\n"),
    ("socialRelations.txt", "0\t1\n1\t0\n1\t2\n"),
    (
        "poiCoos.txt",
        "0\t52.5200\t13.4050\n1\t52.5251\t13.3694\n2\t52.5169\t13.4019\n\
         3\t52.5210\t13.4090\n4\t52.4386\t13.2300\n",
    ),
];

/// Scratch workspace holding a dataset directory plus cache and output roots.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        let dataset = root.join("Berlin");
        fs::create_dir_all(&dataset).expect("dataset directory");
        for (name, contents) in DATASET {
            write_utf8(&dataset.join(name), contents.as_bytes());
        }
        Self { _dir: dir, root }
    }

    pub(super) fn dataset_dir(&self) -> Utf8PathBuf {
        self.root.join("Berlin")
    }

    pub(super) fn cache_dir(&self) -> Utf8PathBuf {
        self.root.join("models")
    }

    pub(super) fn output_dir(&self) -> Utf8PathBuf {
        self.root.join("out")
    }

    /// Arguments pointing every directory into this workspace.
    pub(super) fn args(&self) -> EvaluateArgs {
        EvaluateArgs {
            dataset_dir: Some(self.dataset_dir()),
            cache_dir: Some(self.cache_dir()),
            output_dir: Some(self.output_dir()),
            top_k: Some(2),
            top_restricted: Some(5),
            ..EvaluateArgs::default()
        }
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path, contents).expect("write test file");
}
