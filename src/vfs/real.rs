//! Rooted directory-tree backend.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use super::{Entry, FsReader, FsWriter, VfsError};

/// A filesystem backend rooted at a directory on disk. All paths are
/// interpreted relative to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealFs {
    root: PathBuf,
}

impl RealFs {
    /// Create a backend rooted at `root`. The directory itself is not
    /// created until something is written under it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    pub fn read_dir(&self, dir: &str) -> Result<Vec<Entry>, VfsError> {
        let full = self.full(dir);
        let iter = fs::read_dir(&full).map_err(|e| map_io("reading", dir, e))?;

        let mut entries = Vec::new();
        for item in iter {
            let item = item.map_err(|e| map_io("reading", dir, e))?;
            let file_type = item.file_type().map_err(|e| map_io("reading", dir, e))?;
            entries.push(Entry {
                name: item.file_name().to_string_lossy().into_owned(),
                is_dir: file_type.is_dir(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub fn open(&self, path: &str) -> Result<FsReader, VfsError> {
        let file = File::open(self.full(path)).map_err(|e| map_io("opening", path, e))?;
        Ok(FsReader::Real(file))
    }

    pub fn create(&self, path: &str) -> Result<FsWriter, VfsError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.full(path))
            .map_err(|e| map_io("creating", path, e))?;
        Ok(FsWriter::Real(file))
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<(), VfsError> {
        fs::rename(self.full(from), self.full(to)).map_err(|e| map_io("renaming", from, e))
    }

    /// Create `path` and all missing intermediate directories.
    pub fn mkdir(&self, path: &str) -> Result<(), VfsError> {
        fs::create_dir_all(self.full(path)).map_err(|e| map_io("creating", path, e))
    }

    pub fn remove(&self, path: &str) -> Result<(), VfsError> {
        fs::remove_file(self.full(path)).map_err(|e| map_io("removing", path, e))
    }
}

/// Rename across two rooted backends without going through a copy.
///
/// A "not found" from the OS is ambiguous between a missing source and a
/// missing destination directory; the error names whichever path is
/// actually at fault.
pub(super) fn rename_across(
    from: &RealFs,
    to: &RealFs,
    p_from: &str,
    p_to: &str,
) -> Result<(), VfsError> {
    fs::rename(from.full(p_from), to.full(p_to)).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound && !from.full(p_from).exists() {
            VfsError::NotFound {
                path: p_from.to_string(),
            }
        } else {
            map_io("renaming", p_to, e)
        }
    })
}

fn map_io(op: &'static str, path: &str, source: io::Error) -> VfsError {
    match source.kind() {
        io::ErrorKind::NotFound => VfsError::NotFound {
            path: path.to_string(),
        },
        io::ErrorKind::AlreadyExists => VfsError::AlreadyExists {
            path: path.to_string(),
        },
        _ => VfsError::io(op, path, source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let fs = RealFs::new(temp.path());

        let err = fs.open("missing.txt").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "missing.txt: not found");
    }

    #[test]
    fn test_create_write_read_back() {
        let temp = TempDir::new().unwrap();
        let fs = RealFs::new(temp.path());

        let mut w = fs.create("out.txt").unwrap();
        w.write_all(b"content").unwrap();
        w.close().unwrap();

        let mut buf = String::new();
        fs.open("out.txt").unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "content");
    }

    #[test]
    fn test_create_in_missing_dir_is_not_found() {
        let temp = TempDir::new().unwrap();
        let fs = RealFs::new(temp.path());

        let err = fs.create("sub/out.txt").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mkdir_creates_intermediates() {
        let temp = TempDir::new().unwrap();
        let fs = RealFs::new(temp.path());

        fs.mkdir("a/b/c").unwrap();
        assert!(temp.path().join("a/b/c").is_dir());
    }

    #[test]
    fn test_read_dir_sorted() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("b.txt"), "b").unwrap();
        std::fs::write(temp.path().join("a.txt"), "a").unwrap();
        let fs = RealFs::new(temp.path());

        let names: Vec<_> = fs.read_dir("").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
