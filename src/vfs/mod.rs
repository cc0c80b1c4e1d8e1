//! Virtual filesystem layer.
//!
//! The pipeline writes everything through a small filesystem contract so
//! that workers can stage output in memory and the driver can publish the
//! staged files into the real destination afterwards. Two backends exist:
//! a rooted directory tree ([`RealFs`]) and an in-memory key/buffer store
//! ([`MemFs`]). [`move_entry`] transfers a file between any two backends,
//! preferring a cheap rename and degrading to a stream copy.

pub mod mem;
pub mod real;

pub use mem::{MemFs, MemWriter};
pub use real::RealFs;

use std::fs::File;
use std::io::{self, Cursor, Read, Write};

use thiserror::Error;

/// Error type for filesystem operations.
///
/// Every failure names the path at fault; IO failures also name the
/// operation that was being attempted.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The path does not exist in the backend.
    #[error("{path}: not found")]
    NotFound { path: String },
    /// The path already exists in the backend.
    #[error("{path}: already exists")]
    AlreadyExists { path: String },
    /// An underlying IO failure.
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        source: io::Error,
    },
}

impl VfsError {
    pub(crate) fn io(op: &'static str, path: &str, source: io::Error) -> Self {
        VfsError::Io {
            op,
            path: path.to_string(),
            source,
        }
    }

    /// Whether this error means the path (or its parent directory) was
    /// missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            VfsError::NotFound { .. } => true,
            VfsError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Whether this error means the path already existed.
    pub fn is_already_exists(&self) -> bool {
        match self {
            VfsError::AlreadyExists { .. } => true,
            VfsError::Io { source, .. } => source.kind() == io::ErrorKind::AlreadyExists,
            _ => false,
        }
    }
}

/// One entry from a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Name relative to the listed directory.
    pub name: String,
    /// Whether the entry is itself a directory.
    pub is_dir: bool,
}

/// A filesystem backend.
///
/// Cloning is cheap: a cloned [`MemFs`] shares its store with the
/// original (same instance), and a cloned [`RealFs`] points at the same
/// root.
#[derive(Debug, Clone)]
pub enum Fs {
    /// A rooted directory tree on the real filesystem.
    Real(RealFs),
    /// An in-memory key/buffer store with a flat namespace.
    Mem(MemFs),
}

impl Fs {
    /// List the entries of `dir` (empty string for the backend root),
    /// sorted by name.
    pub fn read_dir(&self, dir: &str) -> Result<Vec<Entry>, VfsError> {
        match self {
            Fs::Real(r) => r.read_dir(dir),
            Fs::Mem(m) => m.read_dir(dir),
        }
    }

    /// Open `path` for reading. Fails with "not found" if it does not
    /// exist.
    pub fn open(&self, path: &str) -> Result<FsReader, VfsError> {
        match self {
            Fs::Real(r) => r.open(path),
            Fs::Mem(m) => m.open(path),
        }
    }

    /// Create `path` for writing. Fails with "already exists" if it does.
    pub fn create(&self, path: &str) -> Result<FsWriter, VfsError> {
        match self {
            Fs::Real(r) => r.create(path),
            Fs::Mem(m) => m.create(path),
        }
    }

    /// Rename `from` to `to` within this backend instance.
    pub fn rename(&self, from: &str, to: &str) -> Result<(), VfsError> {
        match self {
            Fs::Real(r) => r.rename(from, to),
            Fs::Mem(m) => m.rename(from, to),
        }
    }

    /// Create `path` and any missing intermediate directories. A no-op on
    /// backends without directories.
    pub fn mkdir(&self, path: &str) -> Result<(), VfsError> {
        match self {
            Fs::Real(r) => r.mkdir(path),
            Fs::Mem(_) => Ok(()),
        }
    }

    /// Remove `path` from the backend.
    pub fn remove(&self, path: &str) -> Result<(), VfsError> {
        match self {
            Fs::Real(r) => r.remove(path),
            Fs::Mem(m) => m.remove(path),
        }
    }

    fn is_dir_capable(&self) -> bool {
        matches!(self, Fs::Real(_))
    }
}

impl std::fmt::Display for Fs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fs::Real(r) => write!(f, "{}", r.root().display()),
            Fs::Mem(_) => write!(f, "mem"),
        }
    }
}

/// A readable handle produced by [`Fs::open`].
#[derive(Debug)]
pub enum FsReader {
    Real(File),
    Mem(Cursor<Vec<u8>>),
}

impl Read for FsReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FsReader::Real(f) => f.read(buf),
            FsReader::Mem(c) => c.read(buf),
        }
    }
}

/// A writable handle produced by [`Fs::create`].
#[derive(Debug)]
pub enum FsWriter {
    Real(File),
    Mem(MemWriter),
}

impl FsWriter {
    /// Flush and release the handle.
    pub fn close(mut self) -> io::Result<()> {
        self.flush()
    }
}

impl Write for FsWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FsWriter::Real(f) => f.write(buf),
            FsWriter::Mem(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FsWriter::Real(f) => f.flush(),
            FsWriter::Mem(w) => w.flush(),
        }
    }
}

/// Join a directory and a name with a `/`, skipping empty components.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        dir.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}

/// Split a path into its parent directory and final component.
pub fn split(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Move a file from one backend to another.
///
/// Same-kind moves rename where they can: Real-to-Real renames (creating
/// the destination directory and retrying once if it is missing), and a
/// same-instance Mem-to-Mem move transfers the buffer without copying.
/// Every other pairing streams a copy from source to destination,
/// creating missing destination directories on demand.
pub fn move_entry(from: &Fs, to: &Fs, p_from: &str, p_to: &str) -> Result<(), VfsError> {
    match (from, to) {
        (Fs::Real(a), Fs::Real(b)) => {
            if a.root() == b.root() {
                // Moving within the same prefix.
                return a.rename(p_from, p_to);
            }

            // Moving from one prefix to another.
            match real::rename_across(a, b, p_from, p_to) {
                Ok(()) => return Ok(()),
                Err(e) if matches!(&e, VfsError::NotFound { path } if path.as_str() == p_to) => {
                    // The destination directory didn't exist.
                    let (parent, _) = split(p_to);
                    b.mkdir(parent)?;
                    return real::rename_across(a, b, p_from, p_to);
                }
                Err(e) => return Err(e),
            }
        }

        (Fs::Mem(a), Fs::Mem(b)) if a.same_instance(b) => {
            // Move the buffer reference internally, no copy.
            return a.rename(p_from, p_to);
        }

        _ => {}
    }

    // Otherwise, copy.
    let mut src = from.open(p_from)?;

    let mut dst = match to.create(p_to) {
        Ok(w) => w,
        Err(e) if e.is_not_found() && to.is_dir_capable() => {
            // Destination directory needs to be created.
            let (parent, _) = split(p_to);
            to.mkdir(parent)?;
            to.create(p_to)?
        }
        Err(e) => return Err(e),
    };

    io::copy(&mut src, &mut dst).map_err(|e| VfsError::io("copying", p_from, e))?;
    dst.close().map_err(|e| VfsError::io("closing", p_to, e))?;

    from.remove(p_from)
}
