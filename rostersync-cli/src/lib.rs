//! Batch runner behind the `rostersync` binary.
//!
//! Reads snapshot and directory files, loads the live index from a store and
//! runs one sync per snapshot against a shared engine.

use anyhow::{Context, Result, bail};
use futures::future::join_all;
use rostersync_store::Repository;
use rostersync_sync::{DirectoryEntry, StaticDirectory, SyncEngine, SyncOutcome, SyncReport};
use rostersync_types::{Session, StudentSnapshot};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// A snapshot file holds one snapshot or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Many(Vec<StudentSnapshot>),
    One(Box<StudentSnapshot>),
}

pub fn parse_snapshots(json: &str) -> Result<Vec<StudentSnapshot>> {
    let file: SnapshotFile = serde_json::from_str(json).context("Invalid snapshot file")?;
    Ok(match file {
        SnapshotFile::Many(snapshots) => snapshots,
        SnapshotFile::One(snapshot) => vec![*snapshot],
    })
}

/// Parses a JSON array of directory entries.
pub fn parse_directory(json: &str) -> Result<StaticDirectory> {
    let entries: Vec<DirectoryEntry> =
        serde_json::from_str(json).context("Invalid directory file")?;
    Ok(entries.into_iter().collect())
}

/// Loads every offering of the store into the engine's live index.
pub async fn load_live_index(engine: &SyncEngine, store: &dyn Repository) -> Result<usize> {
    let offerings: Vec<_> = {
        let tx = store.begin().await?;
        let ids = tx.offerings()?.into_iter().map(|o| o.id).collect();
        tx.rollback()?;
        ids
    };
    for &offering_id in &offerings {
        engine.load_offering(offering_id).await?;
    }
    debug!("Loaded {} offerings into the live index", offerings.len());
    Ok(offerings.len())
}

/// Syncs all snapshots concurrently. Reports come back in input order.
///
/// Fails before any sync runs when a snapshot names a term code with no
/// session in the store.
pub async fn run_batch(
    engine: &SyncEngine,
    store: &dyn Repository,
    snapshots: &[StudentSnapshot],
) -> Result<Vec<SyncReport>> {
    let mut sessions: HashMap<&str, Session> = HashMap::new();
    {
        let tx = store.begin().await?;
        for snapshot in snapshots {
            let term = snapshot.term_code.as_str();
            if sessions.contains_key(term) {
                continue;
            }
            let Some(session) = tx.find_session_by_term(term)? else {
                bail!("No academic session found for term {term}");
            };
            sessions.insert(term, session);
        }
        tx.rollback()?;
    }

    let syncs = snapshots.iter().map(|snapshot| {
        let session_id = sessions[snapshot.term_code.as_str()].id;
        engine.sync(session_id, snapshot)
    });
    let reports = join_all(syncs).await;
    info!("Synced {} students", reports.len());
    Ok(reports)
}

/// Outcome counts of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub ok: usize,
    pub no_change: usize,
    pub problem: usize,
    pub failure: usize,
}

impl Summary {
    pub fn from_reports(reports: &[SyncReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            match report.outcome {
                SyncOutcome::Ok => summary.ok += 1,
                SyncOutcome::NoChange => summary.no_change += 1,
                SyncOutcome::Problem => summary.problem += 1,
                SyncOutcome::Failure => summary.failure += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.ok + self.no_change + self.problem + self.failure
    }

    pub fn has_failures(&self) -> bool {
        self.failure > 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} students: {} ok, {} unchanged, {} with problems, {} failed",
            self.total(),
            self.ok,
            self.no_change,
            self.problem,
            self.failure
        )
    }
}
