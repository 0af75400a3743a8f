//! Student record reconciliation for rostersync.
//!
//! Takes a [`StudentSnapshot`](rostersync_types::StudentSnapshot) from the
//! external student-information feed and brings the stored record in line
//! with it, touching only what differs.
//!
//! # Architecture
//!
//! - **Diff engine**: identity fields, academic program assignments, group
//!   memberships and advisor links
//! - **Enrollment reconciler**: registration numbers to class enrollments,
//!   keeping one course demand per enrolled course with dense priorities
//! - **Override synchronizer**: override tuples to shared override
//!   reservations, mirrored into the live index once committed
//! - **Orchestrator** ([`SyncEngine`]): per-student lock, one transaction
//!   around all of the above, commit or rollback, result report
//!
//! Unresolvable feed entries never abort a sync. They are logged and turn
//! the outcome into [`SyncOutcome::Problem`]; only errors raised by the
//! store or the live index roll the transaction back.
//!
//! # Example
//!
//! ```no_run
//! use rostersync_live::LiveIndex;
//! use rostersync_store::SqliteStore;
//! use rostersync_sync::{SyncConfig, SyncEngine};
//! use rostersync_types::{SessionId, StudentSnapshot};
//! use std::sync::Arc;
//!
//! # async fn run(session_id: SessionId) -> rostersync_sync::SyncResult<()> {
//! let store = SqliteStore::open("rostersync.db")?;
//! let engine = SyncEngine::new(
//!     Arc::new(store),
//!     Arc::new(LiveIndex::new()),
//!     SyncConfig::default(),
//! )?;
//! let snapshot = StudentSnapshot::new("000123456", "202410").with_registration_number(10432);
//! let report = engine.sync(session_id, &snapshot).await;
//! println!("{} {}", report.external_id, report.outcome);
//! # Ok(())
//! # }
//! ```

mod advisors;
mod class_tree;
mod collaborators;
mod config;
mod demographics;
mod engine;
mod enrollments;
mod error;
mod groups;
mod log;
mod overrides;
mod update;
mod view;

pub use class_tree::ClassTree;
pub use collaborators::{
    DirectoryEntry, DirectoryError, DirectoryLookup, LogNotifier, NoDirectory, NoNotifications,
    NotificationSink, StaticDirectory, StudentChange,
};
pub use config::{IGNORE_GROUPS_ENV, OVERRIDE_TYPES_ENV, Patterns, SyncConfig};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use log::{LogEntry, LogLevel, SyncLog, SyncOutcome, SyncReport};
