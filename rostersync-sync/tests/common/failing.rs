//! Repository wrapper whose transactions fail on one chosen operation.

use async_trait::async_trait;
use rostersync_store::{Repository, SqliteStore, StoreError, StoreResult, Transaction};
use rostersync_types::{
    AcademicArea, AcademicClassification, AcmId, Advisor, AdvisorLink, AreaClassificationMajor,
    AreaId, Class, ClassEnrollment, ClassId, ClassificationId, CourseDemand, CourseId,
    CourseOffering, CourseRequest, DemandId, EnrollmentId, EnrollmentMessage, GroupMembership,
    GroupType, GroupTypeId, InstructionalOffering, Major, MajorId, MessageId, OfferingId,
    OverrideReservation, RegistrationSection, ReservationId, ReservationMember, Role, RoleId,
    Session, SessionId, Student, StudentGroup, StudentId,
};
use std::sync::Arc;

/// Delegates to a [`SqliteStore`] but returns [`StoreError::InvalidData`]
/// from every call to the operation named `fail_on`.
pub struct FailingRepository {
    pub inner: Arc<SqliteStore>,
    pub fail_on: &'static str,
}

impl FailingRepository {
    pub fn new(inner: Arc<SqliteStore>, fail_on: &'static str) -> Self {
        Self { inner, fail_on }
    }
}

#[async_trait]
impl Repository for FailingRepository {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FailingTransaction {
            inner,
            fail_on: self.fail_on,
        }))
    }
}

struct FailingTransaction<'a> {
    inner: Box<dyn Transaction + 'a>,
    fail_on: &'static str,
}

impl FailingTransaction<'_> {
    fn check(&self, op: &str) -> StoreResult<()> {
        if op == self.fail_on {
            return Err(StoreError::InvalidData(format!("{op} failed")));
        }
        Ok(())
    }
}

impl Transaction for FailingTransaction<'_> {
    fn session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        self.check("session")?;
        self.inner.session(id)
    }

    fn find_session_by_term(&self, term_code: &str) -> StoreResult<Option<Session>> {
        self.check("find_session_by_term")?;
        self.inner.find_session_by_term(term_code)
    }

    fn save_session(&mut self, session: &Session) -> StoreResult<()> {
        self.check("save_session")?;
        self.inner.save_session(session)
    }

    fn find_student(
        &self,
        session_id: SessionId,
        external_id: &str,
    ) -> StoreResult<Option<Student>> {
        self.check("find_student")?;
        self.inner.find_student(session_id, external_id)
    }

    fn student(&self, id: StudentId) -> StoreResult<Option<Student>> {
        self.check("student")?;
        self.inner.student(id)
    }

    fn save_student(&mut self, student: &Student) -> StoreResult<()> {
        self.check("save_student")?;
        self.inner.save_student(student)
    }

    fn student_programs(&self, student_id: StudentId) -> StoreResult<Vec<AreaClassificationMajor>> {
        self.check("student_programs")?;
        self.inner.student_programs(student_id)
    }

    fn area(&self, id: AreaId) -> StoreResult<Option<AcademicArea>> {
        self.check("area")?;
        self.inner.area(id)
    }

    fn classification(&self, id: ClassificationId) -> StoreResult<Option<AcademicClassification>> {
        self.check("classification")?;
        self.inner.classification(id)
    }

    fn major(&self, id: MajorId) -> StoreResult<Option<Major>> {
        self.check("major")?;
        self.inner.major(id)
    }

    fn find_area(&self, session_id: SessionId, key: &str) -> StoreResult<Option<AcademicArea>> {
        self.check("find_area")?;
        self.inner.find_area(session_id, key)
    }

    fn find_classification(
        &self,
        session_id: SessionId,
        key: &str,
    ) -> StoreResult<Option<AcademicClassification>> {
        self.check("find_classification")?;
        self.inner.find_classification(session_id, key)
    }

    fn find_major(
        &self,
        session_id: SessionId,
        area_id: AreaId,
        key: &str,
    ) -> StoreResult<Option<Major>> {
        self.check("find_major")?;
        self.inner.find_major(session_id, area_id, key)
    }

    fn save_area(&mut self, area: &AcademicArea) -> StoreResult<()> {
        self.check("save_area")?;
        self.inner.save_area(area)
    }

    fn save_classification(&mut self, classification: &AcademicClassification) -> StoreResult<()> {
        self.check("save_classification")?;
        self.inner.save_classification(classification)
    }

    fn save_major(&mut self, major: &Major) -> StoreResult<()> {
        self.check("save_major")?;
        self.inner.save_major(major)
    }

    fn save_program(&mut self, program: &AreaClassificationMajor) -> StoreResult<()> {
        self.check("save_program")?;
        self.inner.save_program(program)
    }

    fn delete_program(&mut self, id: AcmId) -> StoreResult<()> {
        self.check("delete_program")?;
        self.inner.delete_program(id)
    }

    fn student_groups(&self, student_id: StudentId) -> StoreResult<Vec<StudentGroup>> {
        self.check("student_groups")?;
        self.inner.student_groups(student_id)
    }

    fn find_group(
        &self,
        session_id: SessionId,
        external_id: &str,
    ) -> StoreResult<Option<StudentGroup>> {
        self.check("find_group")?;
        self.inner.find_group(session_id, external_id)
    }

    fn save_group(&mut self, group: &StudentGroup) -> StoreResult<()> {
        self.check("save_group")?;
        self.inner.save_group(group)
    }

    fn group_type(&self, id: GroupTypeId) -> StoreResult<Option<GroupType>> {
        self.check("group_type")?;
        self.inner.group_type(id)
    }

    fn find_group_type(&self, reference: &str) -> StoreResult<Option<GroupType>> {
        self.check("find_group_type")?;
        self.inner.find_group_type(reference)
    }

    fn save_group_type(&mut self, group_type: &GroupType) -> StoreResult<()> {
        self.check("save_group_type")?;
        self.inner.save_group_type(group_type)
    }

    fn add_group_member(&mut self, membership: GroupMembership) -> StoreResult<()> {
        self.check("add_group_member")?;
        self.inner.add_group_member(membership)
    }

    fn remove_group_member(&mut self, membership: GroupMembership) -> StoreResult<()> {
        self.check("remove_group_member")?;
        self.inner.remove_group_member(membership)
    }

    fn role(&self, id: RoleId) -> StoreResult<Option<Role>> {
        self.check("role")?;
        self.inner.role(id)
    }

    fn find_role(&self, reference: &str) -> StoreResult<Option<Role>> {
        self.check("find_role")?;
        self.inner.find_role(reference)
    }

    fn save_role(&mut self, role: &Role) -> StoreResult<()> {
        self.check("save_role")?;
        self.inner.save_role(role)
    }

    fn student_advisors(&self, student_id: StudentId) -> StoreResult<Vec<Advisor>> {
        self.check("student_advisors")?;
        self.inner.student_advisors(student_id)
    }

    fn find_advisor(
        &self,
        session_id: SessionId,
        external_id: &str,
        role_id: RoleId,
    ) -> StoreResult<Option<Advisor>> {
        self.check("find_advisor")?;
        self.inner.find_advisor(session_id, external_id, role_id)
    }

    fn save_advisor(&mut self, advisor: &Advisor) -> StoreResult<()> {
        self.check("save_advisor")?;
        self.inner.save_advisor(advisor)
    }

    fn add_advisor_link(&mut self, link: AdvisorLink) -> StoreResult<()> {
        self.check("add_advisor_link")?;
        self.inner.add_advisor_link(link)
    }

    fn remove_advisor_link(&mut self, link: AdvisorLink) -> StoreResult<()> {
        self.check("remove_advisor_link")?;
        self.inner.remove_advisor_link(link)
    }

    fn offerings(&self) -> StoreResult<Vec<InstructionalOffering>> {
        self.check("offerings")?;
        self.inner.offerings()
    }

    fn offering(&self, id: OfferingId) -> StoreResult<Option<InstructionalOffering>> {
        self.check("offering")?;
        self.inner.offering(id)
    }

    fn save_offering(&mut self, offering: &InstructionalOffering) -> StoreResult<()> {
        self.check("save_offering")?;
        self.inner.save_offering(offering)
    }

    fn course(&self, id: CourseId) -> StoreResult<Option<CourseOffering>> {
        self.check("course")?;
        self.inner.course(id)
    }

    fn save_course(&mut self, course: &CourseOffering) -> StoreResult<()> {
        self.check("save_course")?;
        self.inner.save_course(course)
    }

    fn class(&self, id: ClassId) -> StoreResult<Option<Class>> {
        self.check("class")?;
        self.inner.class(id)
    }

    fn save_class(&mut self, class: &Class) -> StoreResult<()> {
        self.check("save_class")?;
        self.inner.save_class(class)
    }

    fn offering_classes(&self, offering_id: OfferingId) -> StoreResult<Vec<Class>> {
        self.check("offering_classes")?;
        self.inner.offering_classes(offering_id)
    }

    fn offering_courses(&self, offering_id: OfferingId) -> StoreResult<Vec<CourseOffering>> {
        self.check("offering_courses")?;
        self.inner.offering_courses(offering_id)
    }

    fn save_registration_section(&mut self, section: &RegistrationSection) -> StoreResult<()> {
        self.check("save_registration_section")?;
        self.inner.save_registration_section(section)
    }

    fn find_course_by_registration(
        &self,
        registration_number: u32,
        term_code: &str,
    ) -> StoreResult<Option<CourseOffering>> {
        self.check("find_course_by_registration")?;
        self.inner.find_course_by_registration(registration_number, term_code)
    }

    fn find_classes_by_registration(
        &self,
        registration_number: u32,
        term_code: &str,
    ) -> StoreResult<Vec<Class>> {
        self.check("find_classes_by_registration")?;
        self.inner.find_classes_by_registration(registration_number, term_code)
    }

    fn find_courses_by_prefix(
        &self,
        session_id: SessionId,
        subject: &str,
        course_prefix: &str,
    ) -> StoreResult<Vec<CourseOffering>> {
        self.check("find_courses_by_prefix")?;
        self.inner.find_courses_by_prefix(session_id, subject, course_prefix)
    }

    fn student_demands(&self, student_id: StudentId) -> StoreResult<Vec<CourseDemand>> {
        self.check("student_demands")?;
        self.inner.student_demands(student_id)
    }

    fn demand_requests(&self, demand_id: DemandId) -> StoreResult<Vec<CourseRequest>> {
        self.check("demand_requests")?;
        self.inner.demand_requests(demand_id)
    }

    fn save_demand(&mut self, demand: &CourseDemand) -> StoreResult<()> {
        self.check("save_demand")?;
        self.inner.save_demand(demand)
    }

    fn delete_demand(&mut self, id: DemandId) -> StoreResult<()> {
        self.check("delete_demand")?;
        self.inner.delete_demand(id)
    }

    fn save_request(&mut self, request: &CourseRequest) -> StoreResult<()> {
        self.check("save_request")?;
        self.inner.save_request(request)
    }

    fn demand_messages(&self, demand_id: DemandId) -> StoreResult<Vec<EnrollmentMessage>> {
        self.check("demand_messages")?;
        self.inner.demand_messages(demand_id)
    }

    fn save_message(&mut self, message: &EnrollmentMessage) -> StoreResult<()> {
        self.check("save_message")?;
        self.inner.save_message(message)
    }

    fn delete_message(&mut self, id: MessageId) -> StoreResult<()> {
        self.check("delete_message")?;
        self.inner.delete_message(id)
    }

    fn student_enrollments(&self, student_id: StudentId) -> StoreResult<Vec<ClassEnrollment>> {
        self.check("student_enrollments")?;
        self.inner.student_enrollments(student_id)
    }

    fn save_enrollment(&mut self, enrollment: &ClassEnrollment) -> StoreResult<()> {
        self.check("save_enrollment")?;
        self.inner.save_enrollment(enrollment)
    }

    fn delete_enrollment(&mut self, id: EnrollmentId) -> StoreResult<()> {
        self.check("delete_enrollment")?;
        self.inner.delete_enrollment(id)
    }

    fn reservation(&self, id: ReservationId) -> StoreResult<Option<OverrideReservation>> {
        self.check("reservation")?;
        self.inner.reservation(id)
    }

    fn offering_reservations(
        &self,
        offering_id: OfferingId,
    ) -> StoreResult<Vec<OverrideReservation>> {
        self.check("offering_reservations")?;
        self.inner.offering_reservations(offering_id)
    }

    fn student_reservations(&self, student_id: StudentId) -> StoreResult<Vec<OverrideReservation>> {
        self.check("student_reservations")?;
        self.inner.student_reservations(student_id)
    }

    fn reservation_members(&self, reservation_id: ReservationId) -> StoreResult<Vec<StudentId>> {
        self.check("reservation_members")?;
        self.inner.reservation_members(reservation_id)
    }

    fn save_reservation(&mut self, reservation: &OverrideReservation) -> StoreResult<()> {
        self.check("save_reservation")?;
        self.inner.save_reservation(reservation)
    }

    fn delete_reservation(&mut self, id: ReservationId) -> StoreResult<()> {
        self.check("delete_reservation")?;
        self.inner.delete_reservation(id)
    }

    fn add_reservation_member(&mut self, member: ReservationMember) -> StoreResult<()> {
        self.check("add_reservation_member")?;
        self.inner.add_reservation_member(member)
    }

    fn remove_reservation_member(&mut self, member: ReservationMember) -> StoreResult<()> {
        self.check("remove_reservation_member")?;
        self.inner.remove_reservation_member(member)
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        self.inner.commit()
    }

    fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.inner.rollback()
    }
}
