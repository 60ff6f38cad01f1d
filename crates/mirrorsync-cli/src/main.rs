//! MirrorSync CLI - one-way incremental directory synchronization
//!
//! Mirrors a source tree onto a destination, transferring only files that
//! are absent or content-divergent, with per-directory checksum manifests
//! gating the comparisons.
//!
//! ```text
//! mirrorsync /data/photos swift://photo-backup
//! mirrorsync --budget 2147483648 /data swift+dfw://backup archive/2024
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod location;
mod output;

use mirrorsync_core::config::{Config, Credentials};
use mirrorsync_core::domain::newtypes::RelPath;
use mirrorsync_sync::{SyncEngine, SyncOptions};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "mirrorsync", version, about = "Incremental one-way directory mirroring")]
pub struct Cli {
    /// Source location (a path, file://PATH, or swift://CONTAINER)
    source: String,

    /// Destination location (same forms as SOURCE)
    destination: String,

    /// Subtree to synchronize, relative to the source root
    subpath: Option<String>,

    /// Stop transferring once this many bytes have been uploaded
    #[arg(long, value_name = "BYTES")]
    budget: Option<u64>,

    /// Skip checksum comparison: any file already present at the
    /// destination is left untouched
    #[arg(long)]
    no_checksum: bool,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use alternate credentials file
    #[arg(long, value_name = "PATH")]
    credentials: Option<PathBuf>,

    /// Output the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Setup tracing: -v flags win over the config level, RUST_LOG wins
    // over both.
    let filter = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let source_location = location::parse(&cli.source)?;
    let dest_location = location::parse(&cli.destination)?;
    let subpath = match cli.subpath.as_deref() {
        Some(subpath) => RelPath::new(subpath)
            .map_err(|err| anyhow::anyhow!("invalid subpath: {err}"))?,
        None => RelPath::root(),
    };

    // Credentials are only read when a remote side is involved.
    let credentials = if source_location.is_remote() || dest_location.is_remote() {
        let path = cli.credentials.clone().unwrap_or_else(Credentials::default_path);
        Some(Credentials::load(&path).with_context(|| {
            format!("failed to load credentials from {}", path.display())
        })?)
    } else {
        None
    };

    let source = location::backend(&source_location, credentials.as_ref()).await?;
    let destination = location::backend(&dest_location, credentials.as_ref()).await?;

    let mut options = SyncOptions::from_config(&config.sync);
    if cli.budget.is_some() {
        options.budget = cli.budget;
    }
    options.verify_checksums = !cli.no_checksum;

    let engine = SyncEngine::new(source, destination, options);
    let report = engine
        .synchronize(&subpath)
        .await
        .context("synchronization aborted")?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    output::print_report(&report, format);

    if report.has_failures() {
        bail!("{} entries failed to synchronize", report.failures.len());
    }
    Ok(())
}
