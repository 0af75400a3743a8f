//! Transactional entity repository for rostersync.
//!
//! The reconciliation engine only talks to storage through the
//! [`Repository`] and [`Transaction`] traits defined here. Every read and
//! write happens inside a transaction the caller opens with
//! [`Repository::begin`] and finishes with [`Transaction::commit`] or
//! [`Transaction::rollback`]; dropping a transaction without committing
//! discards its writes.
//!
//! # Architecture
//!
//! - [`SqliteStore`] keeps every table in one SQLite database, on disk or
//!   in memory
//! - A transaction holds the connection from `BEGIN IMMEDIATE` to `COMMIT`
//!   or `ROLLBACK`, so transactions are serialized and every read sees the
//!   transaction's own writes
//! - Natural keys are unique constraints: one student per (session, external
//!   id), one group per (session, external id), one advisor per (session,
//!   external id, role), one reservation per (offering, kind, classes,
//!   configurations)
//!
//! Shared edges (group, advisor and reservation membership) are stored as
//! separate rows rather than as sets on either endpoint.

mod error;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use rostersync_types::{
    AcademicArea, AcademicClassification, AcmId, Advisor, AdvisorLink, AreaClassificationMajor,
    AreaId, Class, ClassEnrollment, ClassId, ClassificationId, CourseDemand, CourseId,
    CourseOffering, CourseRequest, DemandId, EnrollmentId, EnrollmentMessage, GroupMembership,
    GroupType, GroupTypeId, InstructionalOffering, Major, MajorId, MessageId, OfferingId,
    OverrideReservation, RegistrationSection, ReservationId, ReservationMember, Role, RoleId,
    Session, SessionId, Student, StudentGroup, StudentId,
};

/// Source of transactions.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Opens a new transaction, waiting for the one in progress to finish.
    async fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>>;
}

/// One unit of work against the repository.
///
/// All lookups are scoped to what the caller passes in (usually the
/// academic session) and observe the transaction's own uncommitted writes.
pub trait Transaction: Send {
    // ── Sessions & students ──────────────────────────────────────

    fn session(&self, id: SessionId) -> StoreResult<Option<Session>>;

    /// Finds the session whose feed term code matches.
    fn find_session_by_term(&self, term_code: &str) -> StoreResult<Option<Session>>;

    fn save_session(&mut self, session: &Session) -> StoreResult<()>;

    fn find_student(&self, session_id: SessionId, external_id: &str)
    -> StoreResult<Option<Student>>;

    fn student(&self, id: StudentId) -> StoreResult<Option<Student>>;

    /// Inserts or updates a student.
    fn save_student(&mut self, student: &Student) -> StoreResult<()>;

    // ── Academic programs ────────────────────────────────────────

    fn student_programs(&self, student_id: StudentId) -> StoreResult<Vec<AreaClassificationMajor>>;

    fn area(&self, id: AreaId) -> StoreResult<Option<AcademicArea>>;

    fn classification(&self, id: ClassificationId) -> StoreResult<Option<AcademicClassification>>;

    fn major(&self, id: MajorId) -> StoreResult<Option<Major>>;

    /// Finds an area by external id, falling back to abbreviation.
    fn find_area(&self, session_id: SessionId, key: &str) -> StoreResult<Option<AcademicArea>>;

    /// Finds a classification by external id, falling back to code.
    fn find_classification(
        &self,
        session_id: SessionId,
        key: &str,
    ) -> StoreResult<Option<AcademicClassification>>;

    /// Finds a major offered under `area_id` by external id, falling back
    /// to code.
    fn find_major(&self, session_id: SessionId, area_id: AreaId, key: &str)
    -> StoreResult<Option<Major>>;

    fn save_area(&mut self, area: &AcademicArea) -> StoreResult<()>;

    fn save_classification(&mut self, classification: &AcademicClassification) -> StoreResult<()>;

    fn save_major(&mut self, major: &Major) -> StoreResult<()>;

    fn save_program(&mut self, program: &AreaClassificationMajor) -> StoreResult<()>;

    fn delete_program(&mut self, id: AcmId) -> StoreResult<()>;

    // ── Groups ───────────────────────────────────────────────────

    fn student_groups(&self, student_id: StudentId) -> StoreResult<Vec<StudentGroup>>;

    fn find_group(&self, session_id: SessionId, external_id: &str)
    -> StoreResult<Option<StudentGroup>>;

    fn save_group(&mut self, group: &StudentGroup) -> StoreResult<()>;

    fn group_type(&self, id: GroupTypeId) -> StoreResult<Option<GroupType>>;

    fn find_group_type(&self, reference: &str) -> StoreResult<Option<GroupType>>;

    fn save_group_type(&mut self, group_type: &GroupType) -> StoreResult<()>;

    fn add_group_member(&mut self, membership: GroupMembership) -> StoreResult<()>;

    fn remove_group_member(&mut self, membership: GroupMembership) -> StoreResult<()>;

    // ── Advisors ─────────────────────────────────────────────────

    fn role(&self, id: RoleId) -> StoreResult<Option<Role>>;

    fn find_role(&self, reference: &str) -> StoreResult<Option<Role>>;

    fn save_role(&mut self, role: &Role) -> StoreResult<()>;

    fn student_advisors(&self, student_id: StudentId) -> StoreResult<Vec<Advisor>>;

    fn find_advisor(
        &self,
        session_id: SessionId,
        external_id: &str,
        role_id: RoleId,
    ) -> StoreResult<Option<Advisor>>;

    fn save_advisor(&mut self, advisor: &Advisor) -> StoreResult<()>;

    fn add_advisor_link(&mut self, link: AdvisorLink) -> StoreResult<()>;

    fn remove_advisor_link(&mut self, link: AdvisorLink) -> StoreResult<()>;

    // ── Course catalog ───────────────────────────────────────────

    fn offerings(&self) -> StoreResult<Vec<InstructionalOffering>>;

    fn offering(&self, id: OfferingId) -> StoreResult<Option<InstructionalOffering>>;

    fn save_offering(&mut self, offering: &InstructionalOffering) -> StoreResult<()>;

    fn course(&self, id: CourseId) -> StoreResult<Option<CourseOffering>>;

    fn save_course(&mut self, course: &CourseOffering) -> StoreResult<()>;

    fn class(&self, id: ClassId) -> StoreResult<Option<Class>>;

    fn save_class(&mut self, class: &Class) -> StoreResult<()>;

    fn offering_classes(&self, offering_id: OfferingId) -> StoreResult<Vec<Class>>;

    fn offering_courses(&self, offering_id: OfferingId) -> StoreResult<Vec<CourseOffering>>;

    /// Inserts or replaces the section keyed by term and registration number.
    fn save_registration_section(&mut self, section: &RegistrationSection) -> StoreResult<()>;

    /// Course offering a registration number maps to in a term.
    fn find_course_by_registration(
        &self,
        registration_number: u32,
        term_code: &str,
    ) -> StoreResult<Option<CourseOffering>>;

    /// All classes a registration number maps to in a term.
    fn find_classes_by_registration(
        &self,
        registration_number: u32,
        term_code: &str,
    ) -> StoreResult<Vec<Class>>;

    /// Offered courses of a session whose subject matches exactly and whose
    /// course number starts with `course_prefix`.
    fn find_courses_by_prefix(
        &self,
        session_id: SessionId,
        subject: &str,
        course_prefix: &str,
    ) -> StoreResult<Vec<CourseOffering>>;

    // ── Course demands & enrollments ─────────────────────────────

    fn student_demands(&self, student_id: StudentId) -> StoreResult<Vec<CourseDemand>>;

    fn demand_requests(&self, demand_id: DemandId) -> StoreResult<Vec<CourseRequest>>;

    fn save_demand(&mut self, demand: &CourseDemand) -> StoreResult<()>;

    /// Deletes a demand together with its requests and enrollment messages.
    fn delete_demand(&mut self, id: DemandId) -> StoreResult<()>;

    fn save_request(&mut self, request: &CourseRequest) -> StoreResult<()>;

    fn demand_messages(&self, demand_id: DemandId) -> StoreResult<Vec<EnrollmentMessage>>;

    fn save_message(&mut self, message: &EnrollmentMessage) -> StoreResult<()>;

    fn delete_message(&mut self, id: MessageId) -> StoreResult<()>;

    fn student_enrollments(&self, student_id: StudentId) -> StoreResult<Vec<ClassEnrollment>>;

    fn save_enrollment(&mut self, enrollment: &ClassEnrollment) -> StoreResult<()>;

    fn delete_enrollment(&mut self, id: EnrollmentId) -> StoreResult<()>;

    // ── Override reservations ────────────────────────────────────

    fn reservation(&self, id: ReservationId) -> StoreResult<Option<OverrideReservation>>;

    fn offering_reservations(&self, offering_id: OfferingId)
    -> StoreResult<Vec<OverrideReservation>>;

    fn student_reservations(&self, student_id: StudentId) -> StoreResult<Vec<OverrideReservation>>;

    fn reservation_members(&self, reservation_id: ReservationId) -> StoreResult<Vec<StudentId>>;

    fn save_reservation(&mut self, reservation: &OverrideReservation) -> StoreResult<()>;

    /// Deletes a reservation together with its memberships.
    fn delete_reservation(&mut self, id: ReservationId) -> StoreResult<()>;

    fn add_reservation_member(&mut self, member: ReservationMember) -> StoreResult<()>;

    fn remove_reservation_member(&mut self, member: ReservationMember) -> StoreResult<()>;

    // ── Completion ───────────────────────────────────────────────

    /// Makes every write of this transaction visible to later transactions.
    fn commit(self: Box<Self>) -> StoreResult<()>;

    /// Discards every write of this transaction.
    fn rollback(self: Box<Self>) -> StoreResult<()>;
}
