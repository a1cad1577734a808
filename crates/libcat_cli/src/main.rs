//! libcat command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Hand the catalog path to the session runner.

mod menu;
mod session;

use anyhow::{bail, Context, Result};
use clap::Parser;
use libcat_core::{default_log_level, init_logging};
use log::info;
use menu::SessionEnd;
use std::io;
use std::path::PathBuf;

/// Interactive catalog manager for a small library
#[derive(Parser, Debug)]
#[command(name = "libcat", version)]
struct Args {
    /// Catalog database file
    #[arg(
        long,
        env = "LIBCAT_DB",
        value_name = "PATH",
        default_value = "library.sqlite3"
    )]
    db: PathBuf,

    /// Directory for rolling log files; logging stays off when unset
    #[arg(long, env = "LIBCAT_LOG_DIR", value_name = "PATH")]
    log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "LIBCAT_LOG_LEVEL", value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_dir) = &args.log_dir {
        let log_dir = std::path::absolute(log_dir)
            .with_context(|| format!("cannot resolve log directory `{}`", log_dir.display()))?;
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        // Logging failures are reported and the session continues.
        if let Err(err) = init_logging(level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    info!(
        "event=session_start module=cli status=ok version={} db={}",
        libcat_core::core_version(),
        args.db.display()
    );
    let end = session::run_session(&args.db, io::stdin().lock(), io::stdout().lock())?;

    if end == SessionEnd::SaveFailed {
        bail!("catalog changes were not saved to `{}`", args.db.display());
    }
    Ok(())
}
