//! Generated C++ project: encoding, per-resource files, and aggregates.
//!
//! [`Target`] is the write side of a run. Workers call [`Target::create`]
//! to open a resource, stream the input into it, and hand it back through
//! [`Target::close`]; the driver then calls [`Target::finalize`] with the
//! collected metadata to render the aggregate files. All writes land in
//! the target's staging backend; nothing here touches the destination.

pub mod array_writer;
pub mod creator;
pub mod resource;
pub mod templates;

pub use array_writer::{ArrayWriter, BYTES_PER_LINE, PAGE_SIZE};
pub use creator::{create_static_files, render_decl, Creator, ALL_CREATORS};
pub use resource::{sort_resources, var_name, AssetSink, Resource, ResourceMeta};

use std::io::{self, Write};
use std::sync::Mutex;

use thiserror::Error;

use crate::compress::{CountingWriter, Maker, Pool};
use crate::vfs::{Fs, VfsError};

/// Error type for resource encoding and file generation.
#[derive(Debug, Error)]
pub enum CppError {
    #[error("creating asset {name}: {source}")]
    CreateAsset { name: String, source: VfsError },
    #[error("creating decl {name}: {source}")]
    CreateDecl { name: String, source: VfsError },
    #[error("encoding {name}: {source}")]
    Encode { name: String, source: io::Error },
    #[error("closing asset {name}: {source}")]
    CloseAsset { name: String, source: io::Error },
    #[error("expanding decl {name}: {source}")]
    ExpandDecl { name: String, source: io::Error },
    #[error("closing decl {name}: {source}")]
    CloseDecl { name: String, source: io::Error },
    #[error("creating {file}: {source}")]
    Create { file: String, source: VfsError },
    #[error("writing {file}: {source}")]
    Write { file: String, source: io::Error },
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Several independent failures from one finalize pass.
#[derive(Debug)]
pub struct AggregateError {
    pub errors: Vec<CppError>,
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} errors: ", self.errors.len())?;
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// The write side of one run: a staging backend plus a shared compressor
/// pool. Shared by reference across worker threads.
pub struct Target {
    fs: Fs,
    pool: Pool<AssetSink>,
}

impl Target {
    pub fn new(fs: Fs, maker: Maker) -> Self {
        Self {
            fs,
            pool: Pool::new(maker),
        }
    }

    /// The backend all generated files are staged in.
    pub fn staging(&self) -> &Fs {
        &self.fs
    }

    /// Open a new resource for `name`: its encoded-payload file and its
    /// declaration unit, with a pooled compressor bound onto the payload
    /// chain.
    ///
    /// Two names deriving the same identifier collide here: the second
    /// create fails with "already exists", which aborts the run rather
    /// than generating a project that cannot compile.
    pub fn create(&self, name: &str) -> Result<Resource, CppError> {
        let asset = self
            .fs
            .create(&creator::asset_path(name))
            .map_err(|e| CppError::CreateAsset {
                name: name.to_string(),
                source: e,
            })?;

        let decl = self
            .fs
            .create(&creator::decl_path(name))
            .map_err(|e| CppError::CreateDecl {
                name: name.to_string(),
                source: e,
            })?;

        let mut comp = self.pool.get();
        comp.reset(Some(CountingWriter::new(ArrayWriter::new(asset))))
            .map_err(|e| CppError::Encode {
                name: name.to_string(),
                source: e,
            })?;

        Ok(Resource {
            name: name.to_string(),
            size: 0,
            comp,
            decl,
        })
    }

    /// Finish a resource: flush the compressor's trailer, render the
    /// remaining partial page, close the payload file, then render the
    /// declaration with the now-final sizes.
    ///
    /// Every release step runs even if an earlier one fails; failures are
    /// collected and reported together. The compressor goes back to the
    /// pool either way.
    pub fn close(&self, res: Resource) -> Result<ResourceMeta, CppError> {
        let Resource {
            name,
            size,
            mut comp,
            mut decl,
        } = res;

        let mut errors = Vec::new();

        let finished = comp.finish();
        self.pool.put(comp);

        let compressed_size = match finished {
            Ok(Some(counter)) => {
                let written = counter.written();
                match counter.into_inner().close() {
                    Ok(asset) => {
                        if let Err(e) = asset.close() {
                            errors.push(CppError::CloseAsset {
                                name: name.clone(),
                                source: e,
                            });
                        }
                    }
                    Err(e) => errors.push(CppError::CloseAsset {
                        name: name.clone(),
                        source: e,
                    }),
                }
                written
            }
            Ok(None) => {
                errors.push(CppError::Encode {
                    name: name.clone(),
                    source: io::Error::new(io::ErrorKind::NotConnected, "compressor has no sink"),
                });
                0
            }
            Err(e) => {
                errors.push(CppError::Encode {
                    name: name.clone(),
                    source: e,
                });
                0
            }
        };

        let meta = ResourceMeta {
            name,
            size,
            compressed_size,
        };

        if let Err(e) = decl.write_all(render_decl(&meta).as_bytes()) {
            errors.push(CppError::ExpandDecl {
                name: meta.name.clone(),
                source: e,
            });
        }
        if let Err(e) = decl.close() {
            errors.push(CppError::CloseDecl {
                name: meta.name.clone(),
                source: e,
            });
        }

        match errors.len() {
            0 => Ok(meta),
            1 => Err(errors.remove(0)),
            _ => Err(AggregateError { errors }.into()),
        }
    }

    /// Write the input-independent files into staging.
    pub fn create_static_files(&self) -> Result<(), CppError> {
        creator::create_static_files(&self.fs)
    }

    /// Sort the finished resources into canonical order and render every
    /// aggregate file concurrently. All four renders run even if one
    /// fails; multiple failures come back as one [`AggregateError`].
    pub fn finalize(&self, mut metas: Vec<ResourceMeta>) -> Result<(), CppError> {
        sort_resources(&mut metas);

        let errors = Mutex::new(Vec::new());
        std::thread::scope(|s| {
            for c in ALL_CREATORS {
                let metas = &metas;
                let errors = &errors;
                s.spawn(move || {
                    if let Err(e) = c.create(&self.fs, metas) {
                        errors.lock().unwrap().push(e);
                    }
                });
            }
        });

        let mut errors = errors.into_inner().unwrap();
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(AggregateError { errors }.into()),
        }
    }
}
