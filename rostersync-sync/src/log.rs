//! Per-sync message log and result reporting.

use crate::error::SyncError;
use rostersync_types::StudentId;
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Messages accumulated while syncing one student.
///
/// Every entry is mirrored to `tracing` as it is recorded.
#[derive(Debug)]
pub struct SyncLog {
    student: String,
    entries: Vec<LogEntry>,
    problem: bool,
}

impl SyncLog {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            student: external_id.into(),
            entries: Vec::new(),
            problem: false,
        }
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(student = %self.student, "{}", message);
        self.push(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(student = %self.student, "{}", message);
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(student = %self.student, "{}", message);
        self.push(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(student = %self.student, "{}", message);
        self.push(LogLevel::Error, message);
    }

    /// Records an entry that could not be resolved. The sync continues but
    /// its outcome becomes [`SyncOutcome::Problem`].
    pub fn problem(&mut self, message: impl Into<String>) {
        self.error(message);
        self.problem = true;
    }

    pub fn has_problem(&self) -> bool {
        self.problem
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    fn push(&mut self, level: LogLevel, message: String) {
        self.entries.push(LogEntry { level, message });
    }

    /// Closes the log of a sync that committed.
    pub fn finish(self, student_id: Option<StudentId>, changed: bool) -> SyncReport {
        let outcome = match (self.problem, changed) {
            (true, _) => SyncOutcome::Problem,
            (false, true) => SyncOutcome::Ok,
            (false, false) => SyncOutcome::NoChange,
        };
        SyncReport {
            external_id: self.student,
            student_id,
            outcome,
            changed,
            messages: self.entries,
            error: None,
        }
    }

    /// Closes the log of a sync that was rolled back.
    pub fn fail(mut self, student_id: Option<StudentId>, err: SyncError) -> SyncReport {
        self.error(format!("Student update failed: {err}"));
        SyncReport {
            external_id: self.student,
            student_id,
            outcome: SyncOutcome::Failure,
            changed: false,
            messages: self.entries,
            error: Some(err),
        }
    }
}

/// Final classification of one sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SyncOutcome {
    /// Committed, nothing differed.
    NoChange,
    /// Committed with changes.
    Ok,
    /// Committed, but some entries could not be resolved.
    Problem,
    /// Rolled back.
    Failure,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoChange => "NO_CHANGE",
            Self::Ok => "OK",
            Self::Problem => "PROBLEM",
            Self::Failure => "FAILURE",
        })
    }
}

/// What a sync did.
#[derive(Debug)]
pub struct SyncReport {
    pub external_id: String,
    /// `None` when the sync failed before the student was loaded.
    pub student_id: Option<StudentId>,
    pub outcome: SyncOutcome,
    pub changed: bool,
    pub messages: Vec<LogEntry>,
    pub error: Option<SyncError>,
}

impl SyncReport {
    /// Messages at or above `level`.
    pub fn messages_at(&self, level: LogLevel) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(move |m| m.level >= level)
            .map(|m| m.message.as_str())
    }
}
