//! Class enrollments and the course demands backing them.
//!
//! Registration numbers from the snapshot resolve to (course, classes)
//! pairs. The reconciler then keeps exactly one course request per
//! enrolled course, reusing existing requests, splitting demands that had
//! been merged, and dropping enrollments the feed no longer reports.

use crate::error::SyncResult;
use crate::update::StudentUpdate;
use chrono::{DateTime, Utc};
use rostersync_types::{
    Class, ClassEnrollment, ClassId, CourseDemand, CourseId, CourseOffering, CourseRequest,
    DemandId, EnrollmentId, OverrideIntent, RequestId, Student, StudentSnapshot,
};
use std::collections::{BTreeSet, HashMap};

/// Desired classes per course, in the order courses were first reported.
#[derive(Debug, Default)]
pub(crate) struct DesiredEnrollments {
    entries: Vec<(CourseOffering, Vec<Class>)>,
}

impl DesiredEnrollments {
    fn classes_mut(&mut self, course: &CourseOffering) -> &mut Vec<Class> {
        let pos = match self.entries.iter().position(|(c, _)| c.id == course.id) {
            Some(pos) => pos,
            None => {
                self.entries.push((course.clone(), Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

fn new_demand(student: &Student, priority: i32, now: DateTime<Utc>) -> CourseDemand {
    CourseDemand {
        id: DemandId::new(),
        student_id: student.id,
        priority,
        alternative: false,
        waitlist: false,
        timestamp: now,
    }
}

impl StudentUpdate<'_> {
    /// Resolves the snapshot's registration numbers in the session's term.
    ///
    /// Unknown numbers and numbers without classes are problems; numbers
    /// belonging to another session are skipped.
    pub(crate) fn desired_enrollments(
        &mut self,
        snapshot: &StudentSnapshot,
    ) -> SyncResult<DesiredEnrollments> {
        let term = snapshot.term_code.as_str();
        let mut desired = DesiredEnrollments::default();

        for &crn in &snapshot.registration_numbers {
            let Some(course) = self.tx.find_course_by_registration(crn, term)? else {
                self.log.problem(format!(
                    "No course offering found for CRN {crn} and banner session {term}"
                ));
                continue;
            };
            if !self.in_session(course.offering_id)? {
                continue;
            }

            let mut found = false;
            for class in self.tx.find_classes_by_registration(crn, term)? {
                if !self.in_session(class.offering_id)? {
                    continue;
                }
                found = true;
                let classes = desired.classes_mut(&course);
                // The same class may be reached through two numbers of one course.
                if !classes.iter().any(|c| c.id == class.id) {
                    classes.push(class);
                }
            }
            if !found {
                self.log.problem(format!(
                    "No classes found for CRN {crn} and banner session {term}"
                ));
            }
        }
        Ok(desired)
    }

    /// Merges the desired enrollments into the student's demands, requests
    /// and enrollments.
    pub(crate) fn update_enrollments(&mut self, desired: &DesiredEnrollments) -> SyncResult<bool> {
        let now = Utc::now();
        let student_id = self.student.id;
        let mut changed = false;

        // Repair duplicate (course, class) enrollments first.
        let mut enrollments: HashMap<(CourseId, ClassId), ClassEnrollment> = HashMap::new();
        for enrollment in self.tx.student_enrollments(student_id)? {
            let key = (enrollment.course_id, enrollment.class_id);
            if let Some(previous) = enrollments.insert(key, enrollment) {
                self.tx.delete_enrollment(previous.id)?;
                self.log.info(format!("Removed duplicate enrollment {}", previous.id));
                changed = true;
            }
        }

        let mut demands = self.tx.student_demands(student_id)?;
        demands.sort_by(CourseDemand::natural_cmp);
        let mut next_priority = demands
            .iter()
            .filter(|d| !d.alternative)
            .map(|d| d.priority + 1)
            .fold(0, i32::max);
        let mut remaining: BTreeSet<DemandId> = demands.iter().map(|d| d.id).collect();
        let mut fix_demands = false;

        // Index requests by course; a course requested twice means demands
        // were merged and need fixing.
        let mut course_requests: HashMap<CourseId, CourseRequest> = HashMap::new();
        let mut request_counts: HashMap<DemandId, usize> = HashMap::new();
        for demand in &demands {
            for request in self.tx.demand_requests(demand.id)? {
                *request_counts.entry(demand.id).or_default() += 1;
                if course_requests.insert(request.course_id, request).is_some() {
                    fix_demands = true;
                }
            }
        }

        for (course, classes) in &desired.entries {
            let request = match course_requests.get_mut(&course.id) {
                None => {
                    let demand = new_demand(&self.student, next_priority, now);
                    next_priority += 1;
                    let request = CourseRequest {
                        id: RequestId::new(),
                        demand_id: demand.id,
                        course_id: course.id,
                        order: 0,
                        override_intent: None,
                    };
                    self.tx.save_demand(&demand)?;
                    self.tx.save_request(&request)?;
                    self.log.debug(format!(
                        "Added course demand for {} (priority {})",
                        course.course_name(),
                        demand.priority
                    ));
                    fix_demands = true;
                    changed = true;
                    request
                }
                Some(request) => {
                    let demand_id = request.demand_id;
                    let shared = request_counts.get(&demand_id).copied().unwrap_or(0) > 1;
                    if !remaining.remove(&demand_id) && shared {
                        // Already claimed by another course: detach this request.
                        let demand = new_demand(&self.student, next_priority, now);
                        next_priority += 1;
                        self.tx.save_demand(&demand)?;
                        request.demand_id = demand.id;
                        self.tx.save_request(request)?;
                        if let Some(count) = request_counts.get_mut(&demand_id) {
                            *count -= 1;
                        }
                        request_counts.insert(demand.id, 1);
                        self.log.debug(format!(
                            "Split course demand for {} (priority {})",
                            course.course_name(),
                            demand.priority
                        ));
                        fix_demands = true;
                        changed = true;
                    }
                    for message in self.tx.demand_messages(request.demand_id)? {
                        self.tx.delete_message(message.id)?;
                    }
                    request.clone()
                }
            };

            for class in classes {
                let (mut enrollment, mut dirty) = match enrollments.remove(&(course.id, class.id)) {
                    Some(enrollment) => (enrollment, false),
                    None => (
                        ClassEnrollment {
                            id: EnrollmentId::new(),
                            student_id,
                            course_id: course.id,
                            class_id: class.id,
                            request_id: None,
                            timestamp: now,
                        },
                        true,
                    ),
                };
                if enrollment.request_id != Some(request.id) {
                    enrollment.request_id = Some(request.id);
                    dirty = true;
                }
                if dirty {
                    self.tx.save_enrollment(&enrollment)?;
                    changed = true;
                }
            }
        }

        // Whatever is left is no longer reported by the feed.
        let mut deletes: BTreeSet<DemandId> = BTreeSet::new();
        let mut external_drop_deletes: BTreeSet<DemandId> = BTreeSet::new();
        for enrollment in enrollments.into_values() {
            if let Some(request) = course_requests.get(&enrollment.course_id)
                && remaining.contains(&request.demand_id)
            {
                deletes.insert(request.demand_id);
                if request.override_intent == Some(OverrideIntent::ExternalDrop) {
                    external_drop_deletes.insert(request.demand_id);
                }
            }
            self.tx.delete_enrollment(enrollment.id)?;
            self.log.debug(format!("Dropped enrollment in class {}", enrollment.class_id));
            changed = true;
        }

        if fix_demands || !deletes.is_empty() {
            // While students may pre-register, only demands dropped in the
            // external system are removed.
            let purge = if self.session.pre_registration {
                external_drop_deletes
            } else if fix_demands {
                remaining
            } else {
                deletes
            };
            for demand_id in purge {
                self.tx.delete_demand(demand_id)?;
                changed = true;
            }
            changed |= self.renumber_demands()?;
        }
        Ok(changed)
    }

    /// Assigns priorities 0, 1, 2, ... in natural demand order.
    fn renumber_demands(&mut self) -> SyncResult<bool> {
        let mut demands = self.tx.student_demands(self.student.id)?;
        demands.sort_by(CourseDemand::natural_cmp);
        let mut changed = false;
        for (priority, mut demand) in (0..).zip(demands) {
            if demand.priority != priority {
                demand.priority = priority;
                self.tx.save_demand(&demand)?;
                changed = true;
            }
        }
        Ok(changed)
    }
}
