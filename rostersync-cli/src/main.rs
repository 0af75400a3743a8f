//! rostersync command line runner
//!
//! Syncs student snapshots into a SQLite store:
//! 1. Open the store and fill the live index with its offerings
//! 2. Run one sync per snapshot, concurrently; each sync commits on its own
//! 3. Print one line per student and a summary
//!
//! Usage:
//!   rostersync --store rostersync.db --snapshot students.json

use anyhow::{Context, Result, bail};
use clap::Parser;
use rostersync_cli::{Summary, load_live_index, parse_directory, parse_snapshots, run_batch};
use rostersync_live::LiveIndex;
use rostersync_store::{Repository, SqliteStore};
use rostersync_sync::{LogNotifier, SyncConfig, SyncEngine};
use std::{fs, path::PathBuf, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "rostersync")]
#[command(about = "Sync student snapshots into a rostersync store")]
struct Args {
    /// Path to the SQLite store file
    #[arg(short, long)]
    store: PathBuf,

    /// Path to a snapshot file (one snapshot or an array)
    #[arg(long)]
    snapshot: PathBuf,

    /// Path to a JSON sync configuration; defaults to the environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a JSON list of directory entries used for new advisors
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Run the syncs against an in-memory copy of the store
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.verbose { "debug" } else { "info" }));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            SyncConfig::from_json(&json)?
        }
        None => SyncConfig::from_env(),
    };

    let store = if args.dry_run {
        info!("Dry run, syncing against a copy of {}", args.store.display());
        SqliteStore::open_copy(&args.store)
    } else {
        SqliteStore::open(&args.store)
    };
    let store =
        Arc::new(store.with_context(|| format!("Failed to open store {}", args.store.display()))?);
    let json = fs::read_to_string(&args.snapshot)
        .with_context(|| format!("Failed to read snapshots {}", args.snapshot.display()))?;
    let snapshots = parse_snapshots(&json)?;

    let repository: Arc<dyn Repository> = store.clone();
    let mut engine = SyncEngine::new(repository, Arc::new(LiveIndex::new()), config)?
        .with_notifier(Arc::new(LogNotifier));
    if let Some(path) = &args.directory {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read directory {}", path.display()))?;
        engine = engine.with_directory(Arc::new(parse_directory(&json)?));
    }

    let offerings = load_live_index(&engine, &*store).await?;
    info!("Syncing {} students ({} offerings loaded)", snapshots.len(), offerings);

    let reports = run_batch(&engine, &*store, &snapshots).await?;
    for report in &reports {
        println!("{} {}", report.external_id, report.outcome);
        if let Some(err) = &report.error {
            warn!(student = %report.external_id, "{err}");
        }
    }
    let summary = Summary::from_reports(&reports);
    println!("{summary}");

    if summary.has_failures() {
        bail!("{} of {} syncs failed", summary.failure, summary.total());
    }
    Ok(())
}
