//! Command-line surface for the `packr` binary: argument definitions and the
//! leveled stderr output used by the file driver.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

use clap::{Parser, Subcommand};

pub const TOOL_NAME: &str = "packr";
pub const PACKED_EXTENSION: &str = ".pkr";

// ── Display level ─────────────────────────────────────────────────────────────
//
// 0 = silent; 1 = errors only; 2 = normal; 3 = chatty; 4 = debug.
// The library itself never prints; only the binary goes through these.

pub static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(2);

/// Returns the current display level.
#[inline]
pub fn display_level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Sets the display level.
#[inline]
pub fn set_display_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Print to stderr at or above `level`.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::cli::display_level() >= $level {
            eprintln!($($arg)*);
        }
    };
}

// ── Arguments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = TOOL_NAME, version, about = "PACKR telemetry codec")]
pub struct Cli {
    /// Suppress all output except errors (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Increase verbosity (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Encode a JSON file into a PACKR frame.
    Encode {
        /// Input JSON file.
        input: PathBuf,
        /// Output path; defaults to the input with `.pkr` appended.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Disable the LZ77 post-transform.
        #[arg(long)]
        no_compress: bool,
        /// Stream the body through the 4 KiB-window compressor instead of
        /// buffering the whole frame.
        #[arg(long)]
        streaming: bool,
    },
    /// Decode a PACKR frame back into JSON.
    Decode {
        /// Input `.pkr` file.
        input: PathBuf,
        /// Output path; defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print frame header information without decoding the body.
    Info {
        /// Input `.pkr` file.
        input: PathBuf,
    },
}

impl Cli {
    /// Fold `-q` / `-v` counts into the global display level.
    pub fn apply_verbosity(&self) {
        let base = 2i64 + self.verbose as i64 - self.quiet as i64;
        set_display_level(base.clamp(0, 4) as u32);
    }
}
