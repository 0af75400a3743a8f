//! Read-only student view published to the live index.

use rostersync_types::{ClassId, CourseId, SessionId, StudentId};
use serde::{Deserialize, Serialize};

/// A student's course requests and enrollments as seen by live readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentView {
    pub student_id: StudentId,
    pub session_id: SessionId,
    pub external_id: String,
    pub name: String,
    /// Requests in demand order.
    pub requests: Vec<RequestView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestView {
    pub course_id: CourseId,
    pub course_name: String,
    pub priority: i32,
    pub alternative: bool,
    pub waitlist: bool,
    /// Enrolled classes, empty when the request is not enrolled.
    pub class_ids: Vec<ClassId>,
}

impl StudentView {
    /// Total number of enrolled classes.
    pub fn enrolled_classes(&self) -> usize {
        self.requests.iter().map(|r| r.class_ids.len()).sum()
    }

    pub fn request(&self, course_id: CourseId) -> Option<&RequestView> {
        self.requests.iter().find(|r| r.course_id == course_id)
    }
}
