//! Sync orchestrator.
//!
//! One call to [`SyncEngine::sync`] runs the whole student update:
//!
//! 1. take the student's exclusive lock, keyed by `(session, external id)`
//! 2. open a transaction and run demographics, groups, advisors,
//!    enrollments and overrides in that order
//! 3. commit, or roll back on the first error
//! 4. mirror the committed reservation changes into the live index
//! 5. after a changed commit, publish the rebuilt student view and queue a
//!    notification
//! 6. release the lock and report

use crate::collaborators::{
    DirectoryLookup, NoDirectory, NoNotifications, NotificationSink, StudentChange,
};
use crate::config::{Patterns, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::log::{SyncLog, SyncReport};
use crate::overrides::{LiveChange, mirror};
use crate::update::StudentUpdate;
use crate::view::student_view;
use rostersync_live::{
    LiveIndex, LiveOffering, LiveReservation, LockKey, StudentLocks, StudentView,
};
use rostersync_store::{Repository, Transaction};
use rostersync_types::{OfferingId, SessionId, Student, StudentId, StudentSnapshot};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reconciles student snapshots against a repository and the live index.
///
/// Cheap to share: wrap it in an `Arc` and call [`SyncEngine::sync`] from as
/// many tasks as needed. Syncs of different students run in parallel; syncs
/// of the same student queue on its lock.
pub struct SyncEngine {
    repository: Arc<dyn Repository>,
    live: Arc<LiveIndex>,
    locks: StudentLocks,
    directory: Arc<dyn DirectoryLookup>,
    notifier: Arc<dyn NotificationSink>,
    config: SyncConfig,
    patterns: Patterns,
}

/// Result of a committed transaction.
struct Committed {
    student: Student,
    changed: bool,
    live_changes: Vec<LiveChange>,
}

impl SyncEngine {
    /// Creates an engine without directory lookups or notifications.
    ///
    /// Fails when a configured pattern does not compile.
    pub fn new(
        repository: Arc<dyn Repository>,
        live: Arc<LiveIndex>,
        config: SyncConfig,
    ) -> SyncResult<Self> {
        let patterns = config.patterns()?;
        Ok(Self {
            repository,
            live,
            locks: StudentLocks::new(),
            directory: Arc::new(NoDirectory),
            notifier: Arc::new(NoNotifications),
            config,
            patterns,
        })
    }

    /// Sets the directory used to fill in new advisors.
    pub fn with_directory(mut self, directory: Arc<dyn DirectoryLookup>) -> Self {
        self.directory = directory;
        self
    }

    /// Sets the sink receiving student-changed notifications.
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn live(&self) -> &Arc<LiveIndex> {
        &self.live
    }

    pub fn locks(&self) -> &StudentLocks {
        &self.locks
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Loads an offering's override reservations into the live index,
    /// replacing whatever the index held for it.
    pub async fn load_offering(&self, offering_id: OfferingId) -> SyncResult<()> {
        let mut offering = LiveOffering::new(offering_id);
        {
            let tx = self.repository.begin().await?;
            for reservation in tx.offering_reservations(offering_id)? {
                let members = tx.reservation_members(reservation.id)?;
                offering.put_reservation(LiveReservation::new(&reservation, members));
            }
            tx.rollback()?;
        }
        self.live.update_offering(offering).await;
        Ok(())
    }

    /// Syncs one student of `session_id` to `snapshot`.
    ///
    /// Never returns an error: failures are rolled back and reported as
    /// [`SyncOutcome::Failure`](crate::SyncOutcome::Failure).
    pub async fn sync(&self, session_id: SessionId, snapshot: &StudentSnapshot) -> SyncReport {
        let mut log = SyncLog::new(&snapshot.external_id);
        let key = LockKey::new(session_id, &snapshot.external_id);

        let mut lock = match self.config.lock_timeout() {
            Some(timeout) => match self.locks.acquire_timeout(key, timeout).await {
                Ok(lock) => lock,
                Err(err) => return log.fail(None, err.into()),
            },
            None => self.locks.acquire(key).await,
        };

        let mut student_id = None;
        let result = self
            .update(session_id, snapshot, &mut log, &mut student_id)
            .await;
        let report = match result {
            Ok(committed) => {
                mirror(&self.live, committed.student.id, &committed.live_changes).await;
                if committed.changed {
                    self.publish(&committed.student, &mut log).await;
                }
                log.finish(Some(committed.student.id), committed.changed)
            }
            Err(err) => log.fail(student_id, err),
        };
        lock.release();

        debug!(
            student = %report.external_id,
            "Student sync finished: {}",
            report.outcome
        );
        report
    }

    /// Runs every step inside one transaction.
    async fn update(
        &self,
        session_id: SessionId,
        snapshot: &StudentSnapshot,
        log: &mut SyncLog,
        student_id: &mut Option<StudentId>,
    ) -> SyncResult<Committed> {
        let mut tx = self.repository.begin().await?;
        match self
            .reconcile(&mut *tx, session_id, snapshot, log, student_id)
            .await
        {
            Ok(committed) => {
                tx.commit()?;
                Ok(committed)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    warn!(
                        student = %snapshot.external_id,
                        "Rollback failed: {rollback}"
                    );
                }
                Err(err)
            }
        }
    }

    async fn reconcile(
        &self,
        tx: &mut dyn Transaction,
        session_id: SessionId,
        snapshot: &StudentSnapshot,
        log: &mut SyncLog,
        student_id: &mut Option<StudentId>,
    ) -> SyncResult<Committed> {
        let session = tx
            .session(session_id)?
            .ok_or(SyncError::SessionNotFound(session_id))?;

        let (student, created) = match tx.find_student(session_id, &snapshot.external_id)? {
            Some(student) => (student, false),
            None => (Student::new(session_id, &snapshot.external_id), true),
        };
        *student_id = Some(student.id);

        let mut update = StudentUpdate::new(tx, &session, student, log, &self.patterns);
        if created {
            let label = update.session_label();
            update.log.info(format!(
                "Added student {} to session {label}",
                snapshot.external_id
            ));
        }

        let mut changed = created;
        let demographics = update.update_demographics(snapshot)?;
        changed |= demographics;
        changed |= update.update_groups(snapshot)?;
        changed |= update
            .update_advisors(snapshot, self.directory.as_ref())
            .await?;

        let desired = update.desired_enrollments(snapshot)?;
        update
            .log
            .debug(format!("Resolved {} enrolled courses", desired.len()));
        changed |= update.update_enrollments(&desired)?;

        if created || demographics {
            update.tx.save_student(&update.student)?;
        }

        changed |= update.update_overrides(snapshot)?;

        Ok(Committed {
            student: update.student,
            changed,
            live_changes: update.live_changes,
        })
    }

    /// Publishes the committed student view and queues the notification.
    async fn publish(&self, student: &Student, log: &mut SyncLog) {
        let before = self.live.student(student.id).await;
        let after = match self.build_view(student).await {
            Ok(view) => view,
            Err(err) => {
                log.warn(format!("Failed to refresh student view: {err}"));
                return;
            }
        };
        self.live.update_student(after.clone()).await;

        if self.config.notify {
            let notifier = Arc::clone(&self.notifier);
            let change = StudentChange {
                student_id: student.id,
                external_id: student.external_id.clone(),
                before,
                after: Some(after),
            };
            tokio::spawn(async move {
                notifier.student_changed(change).await;
            });
        }
    }

    async fn build_view(&self, student: &Student) -> SyncResult<StudentView> {
        let tx = self.repository.begin().await?;
        let view = student_view(&*tx, student)?;
        tx.rollback()?;
        Ok(view)
    }
}
