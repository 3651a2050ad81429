//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Default document root, relative to the working directory.
pub const DEFAULT_DOCS_DIR: &str = "docs";

/// Keep a local documentation mirror fresh.
///
/// Refreshes the mirror in DOCS_DIR when its manifest is older than the
/// staleness threshold, writing only documents whose content changed.
#[derive(Parser, Debug)]
#[command(name = "docmirror")]
#[command(author, version, about)]
pub struct Args {
    /// Directory holding the mirrored files and docs_manifest.json
    #[arg(default_value = DEFAULT_DOCS_DIR)]
    pub docs_dir: PathBuf,

    /// Refresh even if the mirror is fresh
    #[arg(short, long)]
    pub force: bool,

    /// Hold an advisory lock on DOCS_DIR for the run; skip if another run holds it
    #[arg(long)]
    pub lock: bool,

    /// Print manifest age and whether a refresh is due, then exit
    #[arg(long, conflicts_with_all = ["force", "lock"])]
    pub status: bool,

    /// Config file path (default: $XDG_CONFIG_HOME/docmirror/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}

impl Args {
    /// Default log level from -q / -v; `RUST_LOG` still wins when set.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
