//! Command line definition.

use std::path::PathBuf;

use clap::Parser;

use crate::tracing::{LogLevel, TracingFormat};

/// Exit code for a successful run.
pub const EXIT_OK: i32 = 0;

/// Exit code for any failure.
pub const EXIT_ERROR: i32 = 1;

/// Download the aria2c binary for a platform.
///
/// Without a destination the binary is written to standard output.
#[derive(Parser, Debug)]
#[command(name = "get-aria2")]
#[command(about = "Download the aria2c binary for a platform from its GitHub releases")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Where to write the binary.
    #[arg(value_name = "DESTINATION")]
    pub destination: Option<PathBuf>,

    /// Target platform (win32, darwin, linux, android).
    #[arg(short, long, help = "Target platform [default: running system]")]
    pub platform: Option<String>,

    /// Target architecture (x32, x64, arm).
    #[arg(short, long, help = "Target architecture [default: running system]")]
    pub arch: Option<String>,

    /// Mark the written file executable.
    #[arg(short, long, help = "Mark the written file executable")]
    pub chmod: bool,

    /// Append `.exe` to the destination for Windows builds.
    #[arg(short, long, help = "Append .exe to the destination for win32")]
    pub ext: bool,

    /// Suppress status output.
    #[arg(short, long, help = "Suppress status output")]
    pub quiet: bool,

    /// Logging verbosity level.
    #[arg(
        short = 'l',
        long,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Log output format.
    #[arg(
        long,
        help = "Set log output format",
        default_value = "compact",
        value_enum
    )]
    pub log_format: TracingFormat,

    /// Emit logs as JSON, same as `--log-format json`.
    #[arg(long, help = "Emit logs as JSON")]
    pub json: bool,
}

impl Cli {
    /// Log format selected by the flags.
    #[must_use]
    pub const fn tracing_format(&self) -> TracingFormat {
        if self.json {
            TracingFormat::Json
        } else {
            self.log_format
        }
    }

    /// Whether status lines should be printed.
    ///
    /// Never when the binary itself goes to stdout.
    #[must_use]
    pub const fn show_status(&self) -> bool {
        self.destination.is_some() && !self.quiet
    }
}

/// Parse arguments from the process command line.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
