//! In-memory backend used as the pipeline's staging area.
//!
//! Keys form a flat namespace; a path like `res/a.txt` is just a key, and
//! no directory has to exist before it is created. The whole store sits
//! behind one reader/writer lock so workers can stage files concurrently:
//! reads share the lock, every mutation takes it exclusively.

use std::collections::BTreeMap;
use std::io::{self, Cursor, Write};
use std::sync::{Arc, RwLock};

use super::{Entry, FsReader, FsWriter, VfsError};

type Store = Arc<RwLock<BTreeMap<String, Vec<u8>>>>;

/// An ephemeral in-memory filesystem. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    bufs: Store,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `other` is a clone of this backend (shares the store).
    pub fn same_instance(&self, other: &MemFs) -> bool {
        Arc::ptr_eq(&self.bufs, &other.bufs)
    }

    /// List every key in the store, sorted. The namespace is flat, so the
    /// directory argument is ignored and nothing is ever a directory.
    pub fn read_dir(&self, _dir: &str) -> Result<Vec<Entry>, VfsError> {
        let bufs = self.bufs.read().unwrap();
        Ok(bufs
            .keys()
            .map(|name| Entry {
                name: name.clone(),
                is_dir: false,
            })
            .collect())
    }

    /// Open `path` for reading. The buffer is snapshotted under the read
    /// lock, so the reader stays valid while other workers write.
    pub fn open(&self, path: &str) -> Result<FsReader, VfsError> {
        let bufs = self.bufs.read().unwrap();
        match bufs.get(path) {
            Some(buf) => Ok(FsReader::Mem(Cursor::new(buf.clone()))),
            None => Err(VfsError::NotFound {
                path: path.to_string(),
            }),
        }
    }

    /// Reserve `path` and return a writer appending to it.
    pub fn create(&self, path: &str) -> Result<FsWriter, VfsError> {
        let mut bufs = self.bufs.write().unwrap();
        if bufs.contains_key(path) {
            return Err(VfsError::AlreadyExists {
                path: path.to_string(),
            });
        }
        bufs.insert(path.to_string(), Vec::new());

        Ok(FsWriter::Mem(MemWriter {
            bufs: Arc::clone(&self.bufs),
            key: path.to_string(),
        }))
    }

    /// Move the buffer from one key to another without copying.
    pub fn rename(&self, from: &str, to: &str) -> Result<(), VfsError> {
        let mut bufs = self.bufs.write().unwrap();
        if !bufs.contains_key(from) {
            return Err(VfsError::NotFound {
                path: from.to_string(),
            });
        }
        if bufs.contains_key(to) {
            return Err(VfsError::AlreadyExists {
                path: to.to_string(),
            });
        }

        let buf = bufs.remove(from).unwrap_or_default();
        bufs.insert(to.to_string(), buf);
        Ok(())
    }

    pub fn remove(&self, path: &str) -> Result<(), VfsError> {
        let mut bufs = self.bufs.write().unwrap();
        match bufs.remove(path) {
            Some(_) => Ok(()),
            None => Err(VfsError::NotFound {
                path: path.to_string(),
            }),
        }
    }
}

/// A writer handle into a [`MemFs`] key. Each write appends under the
/// store's write lock.
#[derive(Debug)]
pub struct MemWriter {
    bufs: Store,
    key: String,
}

impl Write for MemWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bufs = self.bufs.write().unwrap();
        match bufs.get_mut(&self.key) {
            Some(dst) => {
                dst.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: removed while open", self.key),
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
