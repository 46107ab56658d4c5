//! Capability-based file helpers shared by the LORE crates.
//!
//! Every helper takes a `camino` UTF-8 path and resolves it through a
//! `cap-std` directory handle opened with ambient authority.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io;
use std::path::Component;

/// Open an existing file for reading.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Create (or truncate) a file for writing, creating missing parent directories.
pub fn create_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    ensure_parent_dir(path)?;
    let (dir, file_name) = open_dir_and_file(path)?;
    dir.create(file_name.as_str())
}

/// Open the directory containing `path` and return it alongside the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Create `dir` and all of its ancestors when missing.
pub fn ensure_dir(dir: &Utf8Path) -> io::Result<()> {
    if dir.as_str().is_empty() || dir == Utf8Path::new("/") {
        return Ok(());
    }
    let (base, relative) = base_dir_and_relative(dir)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base.create_dir_all(&relative)
}

/// Create the parent directory of `path` when missing.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    path.parent().map_or(Ok(()), ensure_dir)
}

/// Report whether `path` exists and is a regular file.
///
/// A missing file surfaces as an [`io::ErrorKind::NotFound`] error so callers
/// can tell "absent" apart from "not a file".
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Split `path` into an ambient base directory and the relative remainder.
///
/// Absolute paths are anchored at their root (or Windows prefix); relative
/// paths are anchored at the current directory.
pub fn base_dir_and_relative(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_path = path.as_std_path();
    let base = match std_path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR.to_string())
        }
        Some(Component::RootDir) => Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string()),
        _ => Utf8PathBuf::from("."),
    };
    let relative = if base == Utf8Path::new(".") {
        path.to_path_buf()
    } else {
        path.strip_prefix(&base)
            .map_err(|_| io::Error::other(format!("failed to strip {base} from {path}")))?
            .to_path_buf()
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::io::{Read, Write};
    use tempfile::TempDir;

    #[fixture]
    fn workspace() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        (dir, root)
    }

    #[rstest]
    fn create_utf8_file_builds_missing_parents(
        #[from(workspace)] (_dir, root): (TempDir, Utf8PathBuf),
    ) {
        let target = root.join("Generated/Models/matrix.lsm");
        let mut file = create_utf8_file(&target).expect("create nested file");
        file.write_all(b"payload").expect("write payload");
        drop(file);

        let mut contents = String::new();
        open_utf8_file(&target)
            .expect("reopen")
            .read_to_string(&mut contents)
            .expect("read back");
        assert_eq!(contents, "payload");
    }

    #[rstest]
    fn create_utf8_file_truncates_existing_content(
        #[from(workspace)] (_dir, root): (TempDir, Utf8PathBuf),
    ) {
        let target = root.join("record.txt");
        std::fs::write(target.as_std_path(), b"stale stale stale").expect("seed file");

        let mut file = create_utf8_file(&target).expect("truncate file");
        file.write_all(b"new").expect("write");
        drop(file);

        let contents = std::fs::read_to_string(target.as_std_path()).expect("read");
        assert_eq!(contents, "new");
    }

    #[rstest]
    fn file_is_file_reports_directories(#[from(workspace)] (_dir, root): (TempDir, Utf8PathBuf)) {
        let nested = root.join("nested");
        ensure_dir(&nested).expect("create dir");
        assert!(!file_is_file(&nested).expect("inspect dir"));
    }

    #[rstest]
    fn file_is_file_surfaces_not_found(#[from(workspace)] (_dir, root): (TempDir, Utf8PathBuf)) {
        let err = file_is_file(&root.join("absent.txt")).expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
