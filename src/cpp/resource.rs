//! Per-file unit of work and the derived-identifier rules.

use std::io::{self, Write};

use crate::compress::{Compressor, CountingWriter};
use crate::vfs::FsWriter;

use super::array_writer::ArrayWriter;

/// The output chain a resource's compressor writes into: compressed
/// bytes are counted, encoded as an array literal, and land in the
/// staged asset file.
pub type AssetSink = CountingWriter<ArrayWriter<FsWriter>>;

/// Map a resource name to a valid C++ identifier.
///
/// ASCII letters and digits pass through; everything else becomes `_`.
/// A leading digit becomes `d` so the identifier never starts with one.
/// Total and idempotent; also the canonical sort key for generated
/// output.
pub fn var_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            out.push('d');
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

/// One in-flight resource: the compression/encoding chain writing the
/// asset file, plus the open declaration sink. Owned by exactly one
/// worker; closed exactly once via [`Target::close`].
///
/// [`Target::close`]: super::Target::close
pub struct Resource {
    pub(super) name: String,
    pub(super) size: u64,
    pub(super) comp: Compressor<AssetSink>,
    pub(super) decl: FsWriter,
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Resource {
    /// The original filename of the resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed bytes written through so far.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Write for Resource {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.comp.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.comp.flush()
    }
}

/// Immutable snapshot of a closed resource, consumed by the aggregate
/// renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMeta {
    /// Original filename.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Compressed size in bytes (bytes fed to the array encoder).
    pub compressed_size: u64,
}

impl ResourceMeta {
    /// The sanitized identifier for this resource.
    pub fn var_name(&self) -> String {
        var_name(&self.name)
    }
}

/// Sort into the canonical order every generated file uses: by derived
/// identifier, tie-broken by original name.
pub fn sort_resources(metas: &mut [ResourceMeta]) {
    metas.sort_by_cached_key(|m| (m.var_name(), m.name.clone()));
}
