//! Persisted entity model.
//!
//! Relationships are explicit rows keyed by identifiers rather than object
//! back-references: a student exclusively owns its demands, requests and
//! enrollments (each row carries the owner id), while group, advisor and
//! reservation membership are shared edge rows.

use crate::ids::*;
use crate::override_kind::OverrideKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// One academic session (term) of one campus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Term code used by the feed (e.g. `"202410"`).
    pub term_code: String,
    pub academic_initiative: String,
    /// Campus code the feed uses for this session, when it differs from the
    /// academic initiative.
    #[serde(default)]
    pub campus: Option<String>,
    /// Students may currently pre-register (enter their own course requests).
    #[serde(default)]
    pub pre_registration: bool,
}

impl Session {
    pub fn new(term_code: impl Into<String>, academic_initiative: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            term_code: term_code.into(),
            academic_initiative: academic_initiative.into(),
            campus: None,
            pre_registration: false,
        }
    }

    /// Feed campus for this session, falling back to the academic initiative.
    pub fn campus(&self) -> &str {
        self.campus.as_deref().unwrap_or(&self.academic_initiative)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub session_id: SessionId,
    pub external_id: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl Student {
    /// Creates an empty student record for the given session.
    pub fn new(session_id: SessionId, external_id: impl Into<String>) -> Self {
        Self {
            id: StudentId::new(),
            session_id,
            external_id: external_id.into(),
            first_name: None,
            middle_name: None,
            last_name: None,
            email: None,
        }
    }

    /// "Last, First Middle" as used in log lines.
    pub fn display_name(&self) -> String {
        let mut name = format!(
            "{}, {}",
            self.last_name.as_deref().unwrap_or(""),
            self.first_name.as_deref().unwrap_or("")
        );
        if let Some(middle) = &self.middle_name {
            name.push(' ');
            name.push_str(middle);
        }
        name
    }
}

// ── Academic programs ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicArea {
    pub id: AreaId,
    pub session_id: SessionId,
    pub external_id: Option<String>,
    pub abbreviation: String,
    pub title: String,
}

impl AcademicArea {
    /// Case-insensitive match on external id or abbreviation.
    pub fn matches(&self, key: &str) -> bool {
        self.external_id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(key))
            || self.abbreviation.eq_ignore_ascii_case(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicClassification {
    pub id: ClassificationId,
    pub session_id: SessionId,
    pub external_id: Option<String>,
    pub code: String,
    pub name: String,
}

impl AcademicClassification {
    /// Case-insensitive match on external id or code.
    pub fn matches(&self, key: &str) -> bool {
        self.external_id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(key))
            || self.code.eq_ignore_ascii_case(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Major {
    pub id: MajorId,
    pub session_id: SessionId,
    pub external_id: Option<String>,
    pub code: String,
    pub name: String,
    /// Areas this major is offered under.
    #[serde(default)]
    pub area_ids: BTreeSet<AreaId>,
}

impl Major {
    /// Case-insensitive match on external id or code.
    pub fn matches(&self, key: &str) -> bool {
        self.external_id
            .as_deref()
            .is_some_and(|id| id.eq_ignore_ascii_case(key))
            || self.code.eq_ignore_ascii_case(key)
    }
}

/// A student's academic program assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaClassificationMajor {
    pub id: AcmId,
    pub student_id: StudentId,
    pub area_id: AreaId,
    pub classification_id: ClassificationId,
    pub major_id: MajorId,
}

// ── Groups & advisors ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupType {
    pub id: GroupTypeId,
    pub reference: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentGroup {
    pub id: GroupId,
    pub session_id: SessionId,
    /// `None` for groups created locally rather than by a feed.
    pub external_id: Option<String>,
    pub abbreviation: String,
    pub name: String,
    pub type_id: Option<GroupTypeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub student_id: StudentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Lookup key, e.g. `"Advisor"` or `"Honors Advisor"`.
    pub reference: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
    pub id: AdvisorId,
    pub session_id: SessionId,
    pub external_id: String,
    pub role_id: RoleId,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub academic_title: Option<String>,
}

impl Advisor {
    pub fn new(session_id: SessionId, external_id: impl Into<String>, role_id: RoleId) -> Self {
        Self {
            id: AdvisorId::new(),
            session_id,
            external_id: external_id.into(),
            role_id,
            first_name: None,
            middle_name: None,
            last_name: None,
            email: None,
            academic_title: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdvisorLink {
    pub advisor_id: AdvisorId,
    pub student_id: StudentId,
}

// ── Course catalog ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionalOffering {
    pub id: OfferingId,
    pub session_id: SessionId,
    #[serde(default)]
    pub not_offered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: CourseId,
    pub offering_id: OfferingId,
    pub subject: String,
    pub course_number: String,
}

impl CourseOffering {
    pub fn course_name(&self) -> String {
        format!("{} {}", self.subject, self.course_number)
    }
}

/// A class section. Classes form a part-of hierarchy within an offering
/// configuration (a lab belongs to a lecture, and so on).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub offering_id: OfferingId,
    pub config_id: ConfigId,
    pub parent_id: Option<ClassId>,
    pub subpart: String,
    pub suffix: String,
}

/// Maps a feed registration number (CRN) in a term to a course and the
/// classes a registration in it implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSection {
    pub term_code: String,
    pub registration_number: u32,
    pub course_id: CourseId,
    pub class_ids: Vec<ClassId>,
}

// ── Course demands & enrollments ─────────────────────────────────

/// What the student asked for when a request was changed through an
/// override workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OverrideIntent {
    Add,
    Drop,
    /// Dropped in the external registration system.
    ExternalDrop,
    Waitlist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDemand {
    pub id: DemandId,
    pub student_id: StudentId,
    pub priority: i32,
    pub alternative: bool,
    pub waitlist: bool,
    pub timestamp: DateTime<Utc>,
}

impl CourseDemand {
    /// Natural ordering: primary demands before alternatives, then by
    /// priority, then by id.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        self.alternative
            .cmp(&other.alternative)
            .then(self.priority.cmp(&other.priority))
            .then(self.id.cmp(&other.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRequest {
    pub id: RequestId,
    pub demand_id: DemandId,
    pub course_id: CourseId,
    pub order: i32,
    #[serde(default)]
    pub override_intent: Option<OverrideIntent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentMessage {
    pub id: MessageId,
    pub demand_id: DemandId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEnrollment {
    pub id: EnrollmentId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub class_id: ClassId,
    pub request_id: Option<RequestId>,
    pub timestamp: DateTime<Utc>,
}

// ── Override reservations ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideReservation {
    pub id: ReservationId,
    pub offering_id: OfferingId,
    pub kind: OverrideKind,
    pub class_ids: BTreeSet<ClassId>,
    /// Configuration-level scoping; reservations created by the sync never
    /// carry any.
    #[serde(default)]
    pub config_ids: BTreeSet<ConfigId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationMember {
    pub reservation_id: ReservationId,
    pub student_id: StudentId,
}
