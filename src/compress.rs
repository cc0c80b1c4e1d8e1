//! Compression strategies and the per-run compressor pool.
//!
//! One strategy is active per run. Compressors are recycled across jobs
//! through [`Pool`]: a worker takes one, binds it onto a fresh output
//! chain with [`Compressor::reset`], streams the input through it,
//! finalizes with [`Compressor::finish`], and hands it back. Recycling is
//! an optimization only; an empty pool just makes a new compressor.

use std::io::{self, Write};
use std::sync::Mutex;

use clap::ValueEnum;
use zstd::stream::write::Encoder;

/// Compression level selector. Each strategy maps these to its own
/// internal values; `Ultra` is the algorithm-specific highest-ratio mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Level {
    #[default]
    Fastest,
    Medium,
    High,
    Ultra,
}

impl Level {
    /// The zstd encoder level for this selector.
    pub fn zstd_level(self) -> i32 {
        match self {
            Level::Fastest => 1,
            Level::Medium => 3,
            Level::High => 9,
            Level::Ultra => 19,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Level::Fastest => "fastest",
            Level::Medium => "medium",
            Level::High => "high",
            Level::Ultra => "ultra",
        };
        write!(f, "{}", name)
    }
}

/// Factory for the run's compressor strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Maker {
    /// Pass bytes through unchanged (compression disabled).
    Store,
    /// Streaming zstd at the given level.
    Zstd(Level),
}

impl Maker {
    /// Make a fresh, unbound compressor.
    pub fn make<W: Write>(self) -> Compressor<W> {
        match self {
            Maker::Store => Compressor::Store(None),
            Maker::Zstd(level) => Compressor::Zstd {
                level: level.zstd_level(),
                enc: None,
            },
        }
    }
}

/// A resettable stream compressor bound to at most one sink at a time.
///
/// Some strategies emit trailer bytes; callers must always [`finish`]
/// before treating the output as complete.
///
/// [`finish`]: Compressor::finish
pub enum Compressor<W: Write> {
    Store(Option<W>),
    Zstd {
        level: i32,
        enc: Option<Encoder<'static, W>>,
    },
}

impl<W: Write> Compressor<W> {
    /// Rebind the compressor to a new sink, clearing internal state.
    /// `None` leaves it unbound (the neutral, poolable state).
    pub fn reset(&mut self, sink: Option<W>) -> io::Result<()> {
        match self {
            Compressor::Store(slot) => {
                *slot = sink;
                Ok(())
            }
            Compressor::Zstd { level, enc } => {
                *enc = match sink {
                    Some(w) => Some(Encoder::new(w, *level)?),
                    None => None,
                };
                Ok(())
            }
        }
    }

    /// Finalize the stream (writing any trailer) and hand back the sink.
    /// Returns `None` if the compressor was unbound.
    pub fn finish(&mut self) -> io::Result<Option<W>> {
        match self {
            Compressor::Store(slot) => Ok(slot.take()),
            Compressor::Zstd { enc, .. } => enc.take().map(Encoder::finish).transpose(),
        }
    }

    fn unbound() -> io::Error {
        io::Error::new(io::ErrorKind::NotConnected, "compressor has no sink")
    }
}

impl<W: Write> Write for Compressor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Compressor::Store(Some(w)) => w.write(buf),
            Compressor::Zstd { enc: Some(e), .. } => e.write(buf),
            _ => Err(Self::unbound()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Compressor::Store(Some(w)) => w.flush(),
            Compressor::Zstd { enc: Some(e), .. } => e.flush(),
            _ => Ok(()),
        }
    }
}

/// Counts the bytes written through it. Sits between the compressor and
/// the encoder so the final compressed size can be reported.
pub struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Total bytes accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Shared pool of reusable compressors for one run.
pub struct Pool<W: Write> {
    maker: Maker,
    idle: Mutex<Vec<Compressor<W>>>,
}

impl<W: Write> Pool<W> {
    pub fn new(maker: Maker) -> Self {
        Self {
            maker,
            idle: Mutex::new(Vec::new()),
        }
    }

    pub fn maker(&self) -> Maker {
        self.maker
    }

    /// Take an idle compressor, or make a fresh one if none is waiting.
    pub fn get(&self) -> Compressor<W> {
        self.idle
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| self.maker.make())
    }

    /// Reset `comp` to the unbound state and return it for reuse.
    pub fn put(&self, mut comp: Compressor<W>) {
        if comp.reset(None).is_ok() {
            self.idle.lock().unwrap().push(comp);
        }
    }
}
