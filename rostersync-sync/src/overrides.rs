//! Override reservations.
//!
//! Override tuples resolve to restricted classes grouped by offering and by
//! raw override type. Each offering then needs exactly one reservation of
//! the classified kind whose class set equals the most specific restricted
//! classes. Reservations are shared between students whenever that
//! signature matches. Membership changes are recorded as [`LiveChange`]s and
//! mirrored into the live index only after the transaction commits, each as
//! a single-student delta under the offering's write lock.

use crate::error::SyncResult;
use crate::update::StudentUpdate;
use rostersync_live::LiveIndex;
use rostersync_types::{
    ClassId, OfferingId, OverrideEntry, OverrideKind, OverrideReservation, ReservationId,
    ReservationMember, StudentId, StudentSnapshot,
};
use std::collections::{BTreeMap, BTreeSet};

/// Restricted classes of one offering, per raw override type.
#[derive(Debug)]
pub(crate) struct OfferingOverrides {
    course_name: String,
    by_type: BTreeMap<String, BTreeSet<ClassId>>,
}

impl OfferingOverrides {
    fn kind(&self) -> OverrideKind {
        OverrideKind::classify(self.by_type.iter().map(|(t, s)| (t.as_str(), s.len())))
    }

    fn classes(&self) -> BTreeSet<ClassId> {
        self.by_type.values().flatten().copied().collect()
    }
}

type DesiredOverrides = BTreeMap<OfferingId, OfferingOverrides>;

fn entry_for<'m>(
    desired: &'m mut DesiredOverrides,
    offering_id: OfferingId,
    course_name: String,
    override_type: &str,
) -> &'m mut BTreeSet<ClassId> {
    desired
        .entry(offering_id)
        .or_insert_with(|| OfferingOverrides {
            course_name,
            by_type: BTreeMap::new(),
        })
        .by_type
        .entry(override_type.to_string())
        .or_default()
}

/// A committed reservation membership change of the synced student.
#[derive(Debug, Clone)]
pub(crate) enum LiveChange {
    /// The student joined; `members` is the full membership at commit.
    Join {
        reservation: OverrideReservation,
        members: Vec<StudentId>,
    },
    /// The student left; `deleted` when the reservation went with them.
    Leave {
        reservation: OverrideReservation,
        deleted: bool,
    },
}

/// Applies committed membership changes of one student to the live index.
/// Offerings not loaded into the index are left alone.
pub(crate) async fn mirror(live: &LiveIndex, student_id: StudentId, changes: &[LiveChange]) {
    for change in changes {
        match change {
            LiveChange::Join {
                reservation,
                members,
            } => {
                if let Some(handle) = live.offering(reservation.offering_id).await {
                    let mut offering = handle.write().await;
                    offering.join_reservation(reservation, student_id, members.iter().copied());
                }
            }
            LiveChange::Leave {
                reservation,
                deleted,
            } => {
                if let Some(handle) = live.offering(reservation.offering_id).await {
                    let mut offering = handle.write().await;
                    if *deleted {
                        offering.remove_reservation(reservation.id);
                    } else {
                        offering.leave_reservation(reservation.id, student_id);
                    }
                }
            }
        }
    }
}

impl StudentUpdate<'_> {
    pub(crate) fn update_overrides(&mut self, snapshot: &StudentSnapshot) -> SyncResult<bool> {
        let desired = self.desired_overrides(snapshot)?;
        let student_id = self.student.id;
        let external_id = self.student.external_id.clone();

        let mut held: BTreeMap<ReservationId, OverrideReservation> = self
            .tx
            .student_reservations(student_id)?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut changed = false;
        'offerings: for (offering_id, overrides) in &desired {
            let kind = overrides.kind();
            let classes = overrides.classes();
            // Course-level restrictions that lift neither limit need no reservation.
            if classes.is_empty() && !kind.allows_over_limit() && !kind.allows_time_conflict() {
                continue;
            }
            let leaves = self.class_tree(*offering_id)?.leaves(&classes);

            let mut matched = None;
            for reservation in self.tx.offering_reservations(*offering_id)? {
                if reservation.kind != kind
                    || !reservation.config_ids.is_empty()
                    || reservation.class_ids != leaves
                {
                    continue;
                }
                if held.remove(&reservation.id).is_some() {
                    continue 'offerings;
                }
                self.tx.add_reservation_member(ReservationMember {
                    reservation_id: reservation.id,
                    student_id,
                })?;
                self.log.info(format!(
                    "Updated {kind} override for {} [{external_id} added]",
                    overrides.course_name
                ));
                matched = Some(reservation);
                break;
            }

            let reservation = match matched {
                Some(reservation) => reservation,
                None => {
                    let reservation = OverrideReservation {
                        id: ReservationId::new(),
                        offering_id: *offering_id,
                        kind,
                        class_ids: leaves,
                        config_ids: BTreeSet::new(),
                    };
                    self.tx.save_reservation(&reservation)?;
                    self.tx.add_reservation_member(ReservationMember {
                        reservation_id: reservation.id,
                        student_id,
                    })?;
                    self.log.info(format!(
                        "Created {kind} override for {} [{external_id} added]",
                        overrides.course_name
                    ));
                    reservation
                }
            };

            let members = self.tx.reservation_members(reservation.id)?;
            self.live_changes.push(LiveChange::Join {
                reservation,
                members,
            });
            changed = true;
        }

        for reservation in held.into_values() {
            let course_name = self.offering_name(reservation.offering_id)?;
            let members = self.tx.reservation_members(reservation.id)?;
            let deleted = members.len() <= 1;
            if deleted {
                self.log.info(format!(
                    "Removed {} override for {course_name} [{external_id} removed]",
                    reservation.kind
                ));
                self.tx.delete_reservation(reservation.id)?;
            } else {
                self.log.info(format!(
                    "Updated {} override for {course_name} [{external_id} removed]",
                    reservation.kind
                ));
                self.tx.remove_reservation_member(ReservationMember {
                    reservation_id: reservation.id,
                    student_id,
                })?;
            }
            self.live_changes.push(LiveChange::Leave {
                reservation,
                deleted,
            });
            changed = true;
        }
        Ok(changed)
    }

    /// Groups the snapshot's override tuples by offering and raw type.
    fn desired_overrides(&mut self, snapshot: &StudentSnapshot) -> SyncResult<DesiredOverrides> {
        let mut desired = DesiredOverrides::new();
        for entry in &snapshot.overrides {
            let override_type = entry.override_type.as_str();
            if override_type.is_empty() {
                continue;
            }
            if !self.patterns.allows_override_type(override_type) {
                self.log.info(format!("Ignoring override type {override_type}"));
                continue;
            }

            let raw_crn = entry.registration_number.as_deref().filter(|r| !r.is_empty());
            let crn = match raw_crn.map(|r| r.trim().parse::<u32>()) {
                Some(Ok(crn)) => Some(crn),
                Some(Err(_)) => {
                    self.log.warn(format!("Failed to parse CRN {}", raw_crn.unwrap_or("")));
                    None
                }
                None => None,
            };

            let term = snapshot.term_code.as_str();
            match crn {
                Some(crn) => self.resolve_registration(entry, crn, term, &mut desired)?,
                None => self.resolve_course(entry, term, &mut desired)?,
            }
        }
        Ok(desired)
    }

    /// Restricts the classes a registration number maps to, with their
    /// ancestors.
    fn resolve_registration(
        &mut self,
        entry: &OverrideEntry,
        crn: u32,
        term: &str,
        desired: &mut DesiredOverrides,
    ) -> SyncResult<()> {
        let Some(course) = self.tx.find_course_by_registration(crn, term)? else {
            self.log.problem(format!(
                "No course offering found for CRN {crn} and banner session {term}"
            ));
            return Ok(());
        };
        if !self.in_session(course.offering_id)? {
            return Ok(());
        }

        let mut restricted = Vec::new();
        for class in self.tx.find_classes_by_registration(crn, term)? {
            if !self.in_session(class.offering_id)? {
                continue;
            }
            restricted.extend(self.class_tree(class.offering_id)?.with_ancestors(class.id));
        }
        if restricted.is_empty() {
            self.log.problem(format!(
                "No classes found for CRN {crn} and banner session {term}"
            ));
            return Ok(());
        }

        entry_for(desired, course.offering_id, course.course_name(), &entry.override_type)
            .extend(restricted);
        Ok(())
    }

    /// Course-level override for every offered course matching subject and
    /// course number prefix.
    fn resolve_course(
        &mut self,
        entry: &OverrideEntry,
        term: &str,
        desired: &mut DesiredOverrides,
    ) -> SyncResult<()> {
        let subject = entry.subject.as_deref().unwrap_or("");
        let course_number = entry.course.as_deref().unwrap_or("");
        let courses = self
            .tx
            .find_courses_by_prefix(self.session.id, subject, course_number)?;
        if courses.is_empty() {
            self.log.problem(format!(
                "No course offering found for subject {subject}, course number {course_number} and banner session {term}"
            ));
            return Ok(());
        }
        for course in courses {
            entry_for(desired, course.offering_id, course.course_name(), &entry.override_type);
        }
        Ok(())
    }

    fn offering_name(&self, offering_id: OfferingId) -> SyncResult<String> {
        Ok(self
            .tx
            .offering_courses(offering_id)?
            .first()
            .map_or_else(|| offering_id.to_string(), |c| c.course_name()))
    }
}
