//! In-memory mirror of offering reservations and student views.
//!
//! Each offering sits behind its own [`RwLock`]; writers lock only the
//! offering they change.

use crate::view::StudentView;
use rostersync_types::{
    ClassId, OfferingId, OverrideKind, OverrideReservation, ReservationId, StudentId,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Live copy of one override reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveReservation {
    pub id: ReservationId,
    pub kind: OverrideKind,
    pub class_ids: BTreeSet<ClassId>,
    pub student_ids: BTreeSet<StudentId>,
}

impl LiveReservation {
    pub fn new(
        reservation: &OverrideReservation,
        students: impl IntoIterator<Item = StudentId>,
    ) -> Self {
        Self {
            id: reservation.id,
            kind: reservation.kind,
            class_ids: reservation.class_ids.clone(),
            student_ids: students.into_iter().collect(),
        }
    }
}

/// Live state of one instructional offering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveOffering {
    pub id: OfferingId,
    pub reservations: Vec<LiveReservation>,
}

impl LiveOffering {
    pub fn new(id: OfferingId) -> Self {
        Self {
            id,
            reservations: Vec::new(),
        }
    }

    pub fn reservation(&self, id: ReservationId) -> Option<&LiveReservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    /// Replaces the reservation with the same id, or adds it.
    pub fn put_reservation(&mut self, reservation: LiveReservation) {
        self.reservations.retain(|r| r.id != reservation.id);
        self.reservations.push(reservation);
    }

    /// Returns whether an entry was removed.
    pub fn remove_reservation(&mut self, id: ReservationId) -> bool {
        let before = self.reservations.len();
        self.reservations.retain(|r| r.id != id);
        self.reservations.len() != before
    }

    /// Adds a student to a reservation. When the offering does not hold the
    /// reservation yet, the entry is created with `members` plus the student.
    pub fn join_reservation(
        &mut self,
        reservation: &OverrideReservation,
        student_id: StudentId,
        members: impl IntoIterator<Item = StudentId>,
    ) {
        match self.reservations.iter_mut().find(|r| r.id == reservation.id) {
            Some(entry) => {
                entry.student_ids.insert(student_id);
            }
            None => {
                let mut entry = LiveReservation::new(reservation, members);
                entry.student_ids.insert(student_id);
                self.reservations.push(entry);
            }
        }
    }

    /// Drops a student from a reservation, removing the whole entry when the
    /// student was its only member.
    pub fn leave_reservation(&mut self, id: ReservationId, student_id: StudentId) {
        let Some(pos) = self.reservations.iter().position(|r| r.id == id) else {
            return;
        };
        if self.reservations[pos].student_ids.len() > 1 {
            self.reservations[pos].student_ids.remove(&student_id);
        } else {
            self.reservations.remove(pos);
        }
    }
}

/// Shared live index.
#[derive(Debug, Default)]
pub struct LiveIndex {
    offerings: RwLock<HashMap<OfferingId, Arc<RwLock<LiveOffering>>>>,
    students: RwLock<HashMap<StudentId, StudentView>>,
}

impl LiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to a loaded offering. Take its write lock to change it.
    pub async fn offering(&self, id: OfferingId) -> Option<Arc<RwLock<LiveOffering>>> {
        self.offerings.read().await.get(&id).cloned()
    }

    /// Copy of a loaded offering's current state.
    pub async fn offering_snapshot(&self, id: OfferingId) -> Option<LiveOffering> {
        let handle = self.offering(id).await?;
        let offering = handle.read().await;
        Some(offering.clone())
    }

    /// Loads or replaces an offering.
    pub async fn update_offering(&self, offering: LiveOffering) {
        let mut offerings = self.offerings.write().await;
        match offerings.get(&offering.id) {
            Some(handle) => {
                *handle.write().await = offering;
            }
            None => {
                debug!("Loaded offering {} into live index", offering.id);
                offerings.insert(offering.id, Arc::new(RwLock::new(offering)));
            }
        }
    }

    pub async fn offering_count(&self) -> usize {
        self.offerings.read().await.len()
    }

    pub async fn student(&self, id: StudentId) -> Option<StudentView> {
        self.students.read().await.get(&id).cloned()
    }

    pub async fn update_student(&self, view: StudentView) {
        self.students.write().await.insert(view.student_id, view);
    }

    pub async fn remove_student(&self, id: StudentId) -> Option<StudentView> {
        self.students.write().await.remove(&id)
    }
}
