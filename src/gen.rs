//! The pipeline driver: job listing, worker pool, and publication.
//!
//! One [`Gen`] describes a run: read every file in `from`, encode each
//! into the staged C++ project, render the aggregates, and move the
//! staged files into `to`. Encoding happens in a pool of scoped worker
//! threads pulling job indices from a shared cursor; the first failure
//! cancels the run and nothing is published.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;

use regex::Regex;
use thiserror::Error;

use crate::compress::Maker;
use crate::cpp::{CppError, ResourceMeta, Target};
use crate::vfs::{move_entry, Fs, MemFs, VfsError};

/// Error type for a pipeline run.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("reading {root}: {source}")]
    ReadSource { root: String, source: VfsError },
    #[error("{name}: directories inside the source are not supported")]
    DirectoryInput { name: String },
    #[error("opening {name}: {source}")]
    OpenInput { name: String, source: VfsError },
    #[error("encoding {name}: {source}")]
    Encode { name: String, source: io::Error },
    #[error(transparent)]
    Process(#[from] CppError),
    #[error("writing static files: {source}")]
    Statics { source: CppError },
    #[error("finalizing: {source}")]
    Finalize { source: CppError },
    #[error("reading staging: {source}")]
    ReadStaging { source: VfsError },
    #[error("publishing {name}: {source}")]
    Publish { name: String, source: VfsError },
}

/// One unit of work: a single file from the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Job {
    name: String,
}

/// A full pipeline run from a source backend to a destination backend.
pub struct Gen {
    /// Source of the raw asset files.
    pub from: Fs,
    /// Destination the finished project is published into.
    pub to: Fs,
    /// Compression strategy for this run.
    pub maker: Maker,
    /// Optional filename filter; `None` accepts everything.
    pub matcher: Option<Regex>,
    /// Skip rendering the aggregate files (enum, mappings, header,
    /// build description). Per-resource and static files still land.
    pub skip_finalize: bool,
    /// Worker thread count; 0 means one per available core.
    pub jobs: usize,
}

impl Gen {
    /// Run the pipeline to completion.
    ///
    /// Everything is staged in memory first; the destination is only
    /// touched once every file has been encoded and rendered. Publishing
    /// moves one file at a time and aborts on the first failure, leaving
    /// earlier moves in place.
    pub fn operate(&self) -> Result<(), GenError> {
        let entries = self
            .from
            .read_dir("")
            .map_err(|e| GenError::ReadSource {
                root: self.from.to_string(),
                source: e,
            })?;

        let mut jobs = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.is_dir {
                return Err(GenError::DirectoryInput { name: entry.name });
            }
            if let Some(m) = &self.matcher {
                if !m.is_match(&entry.name) {
                    continue;
                }
            }
            jobs.push(Job { name: entry.name });
        }

        let staging = Fs::Mem(MemFs::new());
        let target = Target::new(staging.clone(), self.maker);

        let metas = self.run_workers(&target, &jobs)?;

        if !self.skip_finalize {
            target
                .finalize(metas)
                .map_err(|e| GenError::Finalize { source: e })?;
        }

        let staged = staging
            .read_dir("")
            .map_err(|e| GenError::ReadStaging { source: e })?;
        for entry in staged {
            move_entry(&staging, &self.to, &entry.name, &entry.name).map_err(|e| {
                GenError::Publish {
                    name: entry.name.clone(),
                    source: e,
                }
            })?;
        }

        Ok(())
    }

    /// Encode every job through a pool of scoped workers.
    ///
    /// Workers claim job indices from a shared cursor; the first error
    /// sets the cancellation flag, so running jobs finish but no new one
    /// starts. While the workers run, the driver thread writes the
    /// input-independent files and prints a progress line per finished
    /// resource.
    fn run_workers(&self, target: &Target, jobs: &[Job]) -> Result<Vec<ResourceMeta>, GenError> {
        let next = AtomicUsize::new(0);
        let cancelled = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel::<Result<ResourceMeta, GenError>>();

        std::thread::scope(|s| {
            for _ in 0..self.worker_count(jobs.len()) {
                let tx = tx.clone();
                let next = &next;
                let cancelled = &cancelled;

                s.spawn(move || loop {
                    if cancelled.load(Ordering::SeqCst) {
                        return;
                    }
                    let i = next.fetch_add(1, Ordering::SeqCst);
                    if i >= jobs.len() {
                        return;
                    }

                    let result = self.process(target, &jobs[i].name);
                    let failed = result.is_err();
                    if failed {
                        cancelled.store(true, Ordering::SeqCst);
                    }
                    // The receiver may already be gone after a failure.
                    if tx.send(result).is_err() || failed {
                        return;
                    }
                });
            }
            drop(tx);

            let mut first_err = target
                .create_static_files()
                .map_err(|e| GenError::Statics { source: e })
                .err();
            if first_err.is_some() {
                cancelled.store(true, Ordering::SeqCst);
            }

            let mut metas = Vec::with_capacity(jobs.len());
            for result in rx {
                match result {
                    Ok(meta) => {
                        println!("{}:\t{}", meta.name, render_size(meta.size));
                        metas.push(meta);
                    }
                    Err(e) => {
                        cancelled.store(true, Ordering::SeqCst);
                        first_err.get_or_insert(e);
                    }
                }
            }

            match first_err {
                Some(e) => Err(e),
                None => Ok(metas),
            }
        })
    }

    /// Encode one source file into its staged resource.
    fn process(&self, target: &Target, name: &str) -> Result<ResourceMeta, GenError> {
        let mut input = self.from.open(name).map_err(|e| GenError::OpenInput {
            name: name.to_string(),
            source: e,
        })?;

        let mut res = target.create(name)?;
        io::copy(&mut input, &mut res).map_err(|e| GenError::Encode {
            name: name.to_string(),
            source: e,
        })?;

        Ok(target.close(res)?)
    }

    fn worker_count(&self, jobs: usize) -> usize {
        let cores = match self.jobs {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };
        cores.min(jobs).max(1)
    }
}

const KB: u64 = 1 << 10;
const MB: u64 = 1 << 20;
const GB: u64 = 1 << 30;

/// Render a byte count the way the progress output shows it.
pub fn render_size(bytes: u64) -> String {
    match bytes {
        b if b < KB => format!("{} B", b),
        b if b < MB => format!("{:.2} KB", b as f64 / KB as f64),
        b if b < GB => format!("{:.2} MB", b as f64 / MB as f64),
        b => format!("{:.2} GB", b as f64 / GB as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::Level;
    use crate::cpp::ALL_CREATORS;
    use std::io::{Read, Write};

    fn mem_source(files: &[(&str, &[u8])]) -> Fs {
        let fs = Fs::Mem(MemFs::new());
        for (name, content) in files {
            let mut w = fs.create(name).unwrap();
            w.write_all(content).unwrap();
            w.close().unwrap();
        }
        fs
    }

    fn read_text(fs: &Fs, path: &str) -> String {
        let mut buf = String::new();
        fs.open(path).unwrap().read_to_string(&mut buf).unwrap();
        buf
    }

    fn gen(from: Fs, to: Fs, maker: Maker) -> Gen {
        Gen {
            from,
            to,
            maker,
            matcher: None,
            skip_finalize: false,
            jobs: 2,
        }
    }

    #[test]
    fn test_render_size() {
        assert_eq!(render_size(0), "0 B");
        assert_eq!(render_size(1023), "1023 B");
        assert_eq!(render_size(1024), "1.00 KB");
        assert_eq!(render_size(1536), "1.50 KB");
        assert_eq!(render_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(render_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_operate_store_end_to_end() {
        let from = mem_source(&[("al.gif", b"GIF89a data"), ("bob.txt", b"hello bob")]);
        let to = Fs::Mem(MemFs::new());

        gen(from, to.clone(), Maker::Store).operate().unwrap();

        // Per-resource files.
        assert_eq!(
            read_text(&to, "res/al_gif_real.cxx"),
            "0x47,0x49,0x46,0x38,0x39,0x61,0x20,0x64,0x61,0x74,0x61, // |GIF89a.data|\n"
        );
        assert!(read_text(&to, "res/bob_txt_decl.cxx").contains("Mapper::bob_txt_len = 9;"));

        // Aggregates and statics.
        for c in ALL_CREATORS {
            assert!(to.open(c.file_name()).is_ok(), "{}", c.file_name());
        }
        for name in ["mapper.cxx", "resource.hpp", "resource.cxx", ".gitignore"] {
            assert!(to.open(name).is_ok(), "{}", name);
        }

        let id = read_text(&to, "id.hpp");
        assert!(id.contains("\tal_gif, // al.gif\n"));
        assert!(id.contains("\tbob_txt, // bob.txt\n"));
    }

    #[test]
    fn test_operate_zstd_roundtrip() {
        let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let from = mem_source(&[("blob.bin", payload.as_slice())]);
        let to = Fs::Mem(MemFs::new());

        gen(from, to.clone(), Maker::Zstd(Level::Medium))
            .operate()
            .unwrap();

        let text = read_text(&to, "res/blob_bin_real.cxx");
        let mut compressed = Vec::new();
        for line in text.lines() {
            let data = line.split(" //").next().unwrap();
            for lit in data.split(',').map(str::trim).filter(|l| !l.is_empty()) {
                compressed.push(u8::from_str_radix(lit.strip_prefix("0x").unwrap(), 16).unwrap());
            }
        }

        let restored = zstd::stream::decode_all(compressed.as_slice()).unwrap();
        assert_eq!(restored, payload);
    }

    #[test]
    fn test_operate_rejects_directory_input() {
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "x").unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();

        let from = Fs::Real(crate::vfs::RealFs::new(temp.path()));
        let to = Fs::Mem(MemFs::new());

        let err = gen(from, to, Maker::Store).operate().unwrap_err();
        assert!(matches!(err, GenError::DirectoryInput { ref name } if name == "nested"));
    }

    #[test]
    fn test_operate_matcher_filters_jobs() {
        let from = mem_source(&[("keep.gif", b"abc"), ("drop.txt", b"def")]);
        let to = Fs::Mem(MemFs::new());

        let mut g = gen(from, to.clone(), Maker::Store);
        g.matcher = Some(Regex::new(r"\.gif$").unwrap());
        g.operate().unwrap();

        assert!(to.open("res/keep_gif_real.cxx").is_ok());
        assert!(to.open("res/drop_txt_real.cxx").is_err());
    }

    #[test]
    fn test_operate_duplicate_identifiers_abort() {
        let from = mem_source(&[("a.b", b"one"), ("a_b", b"two")]);
        let to = Fs::Mem(MemFs::new());

        let err = gen(from, to.clone(), Maker::Store).operate().unwrap_err();
        assert!(err.to_string().contains("already exists"));

        // Nothing published.
        assert!(to.read_dir("").unwrap().is_empty());
    }

    #[test]
    fn test_first_error_stops_job_dispatch() {
        // One worker, so jobs are picked up strictly in listing order:
        // "a.b" stages fine, "a_b" collides with its identifier and
        // fails, and the jobs after it must never be dispatched.
        let from = mem_source(&[
            ("a.b", b"one"),
            ("a_b", b"two"),
            ("y.txt", b"later"),
            ("z.txt", b"later"),
        ]);
        let mut g = gen(from, Fs::Mem(MemFs::new()), Maker::Store);
        g.jobs = 1;

        let staging = Fs::Mem(MemFs::new());
        let target = Target::new(staging.clone(), Maker::Store);
        let jobs: Vec<Job> = ["a.b", "a_b", "y.txt", "z.txt"]
            .iter()
            .map(|n| Job {
                name: n.to_string(),
            })
            .collect();

        let err = g.run_workers(&target, &jobs).unwrap_err();
        assert!(err.to_string().contains("a_b"));

        // The job before the failure completed.
        assert!(staging.open("res/a_b_real.cxx").is_ok());
        // The jobs after it were never picked up.
        assert!(staging.open("res/y_txt_real.cxx").is_err());
        assert!(staging.open("res/z_txt_real.cxx").is_err());
        assert!(staging.open("res/y_txt_decl.cxx").is_err());
        assert!(staging.open("res/z_txt_decl.cxx").is_err());
    }

    #[test]
    fn test_operate_skip_finalize_leaves_aggregates_out() {
        let from = mem_source(&[("a.txt", b"abc")]);
        let to = Fs::Mem(MemFs::new());

        let mut g = gen(from, to.clone(), Maker::Store);
        g.skip_finalize = true;
        g.operate().unwrap();

        assert!(to.open("res/a_txt_real.cxx").is_ok());
        assert!(to.open("mapper.cxx").is_ok());
        assert!(to.open("id.hpp").is_err());
        assert!(to.open("CMakeLists.txt").is_err());
    }

    #[test]
    fn test_operate_reproducible_output() {
        let files: &[(&str, &[u8])] = &[
            ("z.last", b"zzz"),
            ("a.first", b"aaa"),
            ("m.mid", &[0u8, 1, 2, 3, 255]),
        ];

        let run = || {
            let to = Fs::Mem(MemFs::new());
            gen(mem_source(files), to.clone(), Maker::Zstd(Level::Fastest))
                .operate()
                .unwrap();
            to.read_dir("")
                .unwrap()
                .into_iter()
                .map(|e| {
                    let mut buf = Vec::new();
                    to.open(&e.name).unwrap().read_to_end(&mut buf).unwrap();
                    (e.name, buf)
                })
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
    }
}
