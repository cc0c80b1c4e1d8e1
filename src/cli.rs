//! Command-line interface implementation

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use regex::Regex;

use crate::compress::{Level, Maker};
use crate::gen::Gen;
use crate::vfs::{Fs, RealFs};

/// Exit codes.
const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;
const EXIT_INVALID_ARGS: u8 = 2;

/// resgen - Compile a directory of assets into an embeddable C++ library
#[derive(Parser)]
#[command(name = "resgen")]
#[command(about = "Compile a directory of assets into an embeddable C++ library")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress and encode every file in a directory into a generated
    /// C++ project
    Gen {
        /// Directory containing the raw asset files
        #[arg(long, default_value = "res")]
        from: PathBuf,

        /// Directory the generated project is written into
        #[arg(long, default_value = "gen")]
        to: PathBuf,

        /// Compression level
        #[arg(long, value_enum, default_value_t = Level::Fastest)]
        level: Level,

        /// Only process filenames matching this regular expression
        #[arg(long = "match", value_name = "REGEX")]
        matcher: Option<String>,

        /// Store assets uncompressed
        #[arg(long)]
        no_compress: bool,

        /// Skip the aggregate files (enum, mappings, header, CMake)
        #[arg(long)]
        skip_finalize: bool,

        /// Worker thread count (default: one per core)
        #[arg(long, default_value_t = 0)]
        jobs: usize,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Gen {
            from,
            to,
            level,
            matcher,
            no_compress,
            skip_finalize,
            jobs,
        } => run_gen(
            &from,
            &to,
            level,
            matcher.as_deref(),
            no_compress,
            skip_finalize,
            jobs,
        ),
    }
}

fn run_gen(
    from: &PathBuf,
    to: &PathBuf,
    level: Level,
    matcher: Option<&str>,
    no_compress: bool,
    skip_finalize: bool,
    jobs: usize,
) -> ExitCode {
    let matcher = match matcher.map(Regex::new).transpose() {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: invalid --match expression: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let maker = if no_compress {
        Maker::Store
    } else {
        Maker::Zstd(level)
    };

    let gen = Gen {
        from: Fs::Real(RealFs::new(from)),
        to: Fs::Real(RealFs::new(to)),
        maker,
        matcher,
        skip_finalize,
        jobs,
    };

    match gen.operate() {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
