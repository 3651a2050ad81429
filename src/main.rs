//! CLI entry point for the docmirror tool.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use docmirror_core::sync::LockError;
use docmirror_core::{
    MirrorConfig, MirrorLock, MirrorStatus, RunOutcome, SyncEngine, SyncError, load_config,
};
use tracing::{debug, error, info};

mod cli;

use cli::Args;

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    /// Run completed or was skipped as fresh.
    Success,
    /// Discovery failed, every document failed, or a local write failed.
    Aborted,
    /// Bad configuration or arguments.
    Usage,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => ExitCode::SUCCESS,
            ProcessExit::Aborted => ExitCode::from(1),
            ProcessExit::Usage => ExitCode::from(2),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(args.default_log_level(), args.no_color || no_color_env_requested());
    debug!(?args, "CLI arguments parsed");

    let loaded = match load_config(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("invalid configuration: {e:#}");
            return ProcessExit::Usage.into();
        }
    };
    if loaded.loaded_from_file {
        info!(path = ?loaded.path, "loaded config file");
    }

    match run(&args, loaded.config).await {
        Ok(exit) => exit.into(),
        Err(e) => {
            error!("docmirror failed: {e:#}");
            ProcessExit::Aborted.into()
        }
    }
}

async fn run(args: &Args, config: MirrorConfig) -> Result<ProcessExit> {
    let engine = SyncEngine::with_json_store(config, &args.docs_dir)
        .context("failed to build HTTP client")?;

    if args.status {
        print_status(engine.docs_dir(), &engine.status().await);
        return Ok(ProcessExit::Success);
    }

    let _lock = if args.lock {
        match MirrorLock::try_acquire(&args.docs_dir) {
            Ok(lock) => Some(lock),
            Err(LockError::Busy { path }) => {
                info!(lock = %path.display(), "another run is in progress, skipping");
                return Ok(ProcessExit::Success);
            }
            Err(e) => return Err(e).context("failed to acquire mirror lock"),
        }
    } else {
        None
    };

    info!(docs_dir = %args.docs_dir.display(), force = args.force, "docmirror starting");
    let result = engine.reconcile(args.force).await;
    Ok(determine_exit_outcome(&result))
}

/// Maps a run result to the process exit outcome.
fn determine_exit_outcome(result: &Result<RunOutcome, SyncError>) -> ProcessExit {
    match result {
        Ok(RunOutcome::Skipped { .. }) => ProcessExit::Success,
        Ok(RunOutcome::Completed(summary)) => {
            info!(
                succeeded = summary.pages_fetched_successfully,
                failed = summary.pages_failed,
                "mirror refreshed"
            );
            ProcessExit::Success
        }
        Err(e) => {
            error!(error = %e, "sync run aborted");
            ProcessExit::Aborted
        }
    }
}

fn print_status(docs_dir: &Path, status: &MirrorStatus) {
    println!("docs dir:      {}", docs_dir.display());
    println!("tracked files: {}", status.files);
    match (status.last_updated, status.age) {
        (Some(when), Some(age)) => println!(
            "last updated:  {} ({} ago)",
            when.to_rfc3339(),
            format_age(age)
        ),
        _ => println!("last updated:  never"),
    }
    println!("refresh due:   {}", if status.stale { "yes" } else { "no" });
    if let Some(meta) = &status.fetch_metadata {
        let source = meta
            .discovery_source
            .map_or_else(|| "unknown".to_string(), |s| s.to_string());
        println!(
            "last run:      {} fetched, {} failed (discovery: {source})",
            meta.pages_fetched_successfully, meta.pages_failed
        );
        for page in &meta.failed_pages {
            println!("  failed: {page}");
        }
    }
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    let (hours, minutes) = (secs / 3600, (secs % 3600) / 60);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{secs}s")
    }
}

fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

fn init_tracing(default_level: &str, no_color: bool) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}
