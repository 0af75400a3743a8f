//! State shared by the reconciliation steps of one student.
//!
//! Each step lives in its own module as an `impl StudentUpdate` block and
//! returns `Ok(true)` when it changed anything.

use crate::class_tree::ClassTree;
use crate::config::Patterns;
use crate::error::SyncResult;
use crate::log::SyncLog;
use crate::overrides::LiveChange;
use rostersync_store::Transaction;
use rostersync_types::{OfferingId, Session, Student};

pub(crate) struct StudentUpdate<'a> {
    pub(crate) tx: &'a mut dyn Transaction,
    pub(crate) session: &'a Session,
    pub(crate) student: Student,
    pub(crate) log: &'a mut SyncLog,
    pub(crate) patterns: &'a Patterns,
    /// Reservation changes to mirror into the live index after commit.
    pub(crate) live_changes: Vec<LiveChange>,
    classes: ClassTree,
}

impl<'a> StudentUpdate<'a> {
    pub(crate) fn new(
        tx: &'a mut dyn Transaction,
        session: &'a Session,
        student: Student,
        log: &'a mut SyncLog,
        patterns: &'a Patterns,
    ) -> Self {
        Self {
            tx,
            session,
            student,
            log,
            patterns,
            live_changes: Vec::new(),
            classes: ClassTree::new(),
        }
    }

    /// Class hierarchy with `offering_id` loaded.
    pub(crate) fn class_tree(&mut self, offering_id: OfferingId) -> SyncResult<&ClassTree> {
        if !self.classes.is_loaded(offering_id) {
            let classes = self.tx.offering_classes(offering_id)?;
            self.classes.load(offering_id, &classes);
        }
        Ok(&self.classes)
    }

    /// Whether an offering belongs to the session being synced.
    pub(crate) fn in_session(&self, offering_id: OfferingId) -> SyncResult<bool> {
        Ok(self
            .tx
            .offering(offering_id)?
            .is_some_and(|o| o.session_id == self.session.id))
    }

    /// Session label used in log lines, e.g. `"202410 (PWL)"`.
    pub(crate) fn session_label(&self) -> String {
        format!("{} ({})", self.session.term_code, self.session.academic_initiative)
    }
}
