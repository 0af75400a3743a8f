//! Shared fixture for sync tests: a session with a small course catalog.

#![allow(dead_code)]

mod failing;

pub use failing::FailingRepository;

use chrono::Utc;
use rostersync_live::LiveIndex;
use rostersync_store::{Repository, SqliteStore, Transaction};
use rostersync_sync::{SyncConfig, SyncEngine, SyncReport};
use rostersync_types::{
    Class, ClassId, ConfigId, CourseDemand, CourseId, CourseOffering, CourseRequest, DemandId,
    InstructionalOffering, OfferingId, RegistrationSection, RequestId, Role, RoleId, Session,
    StudentId,
};
use std::sync::Arc;

pub const TERM: &str = "202410";
pub const CAMPUS: &str = "PWL";

/// One course with a lecture and two labs under it.
#[derive(Debug, Clone)]
pub struct CatalogCourse {
    pub course: CourseOffering,
    pub lecture: Class,
    pub labs: Vec<Class>,
}

impl CatalogCourse {
    pub fn offering_id(&self) -> OfferingId {
        self.course.offering_id
    }

    pub fn id(&self) -> CourseId {
        self.course.id
    }

    pub fn lab(&self, n: usize) -> &Class {
        &self.labs[n]
    }
}

pub struct Fixture {
    pub store: Arc<SqliteStore>,
    pub live: Arc<LiveIndex>,
    pub session: Session,
}

pub async fn make_fixture() -> Fixture {
    make_fixture_with(Session::new(TERM, CAMPUS)).await
}

pub async fn make_fixture_with(session: Session) -> Fixture {
    make_fixture_with_roles(session, &["Advisor", "Honors Advisor"]).await
}

pub async fn make_fixture_with_roles(session: Session, roles: &[&str]) -> Fixture {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let mut tx = store.begin().await.unwrap();
    tx.save_session(&session).unwrap();
    for &reference in roles {
        tx.save_role(&Role {
            id: RoleId::new(),
            reference: reference.into(),
            label: reference.into(),
        })
        .unwrap();
    }
    tx.commit().unwrap();
    Fixture {
        store,
        live: Arc::new(LiveIndex::new()),
        session,
    }
}

fn make_class(
    offering_id: OfferingId,
    config_id: ConfigId,
    parent: Option<&Class>,
    subpart: &str,
    suffix: &str,
) -> Class {
    Class {
        id: ClassId::new(),
        offering_id,
        config_id,
        parent_id: parent.map(|p| p.id),
        subpart: subpart.into(),
        suffix: suffix.into(),
    }
}

impl Fixture {
    pub fn engine(&self) -> SyncEngine {
        self.engine_with(SyncConfig::default())
    }

    pub fn engine_with(&self, config: SyncConfig) -> SyncEngine {
        let repository: Arc<dyn Repository> = self.store.clone();
        SyncEngine::new(repository, Arc::clone(&self.live), config).unwrap()
    }

    /// Engine over this fixture's store whose transactions fail on `fail_on`.
    pub fn failing_engine(&self, fail_on: &'static str) -> SyncEngine {
        let repository = Arc::new(FailingRepository::new(Arc::clone(&self.store), fail_on));
        SyncEngine::new(repository, Arc::clone(&self.live), SyncConfig::default()).unwrap()
    }

    /// Adds a course in this fixture's session.
    pub async fn add_course(&self, subject: &str, number: &str) -> CatalogCourse {
        self.add_course_in(&self.session, subject, number, false)
            .await
    }

    pub async fn add_course_in(
        &self,
        session: &Session,
        subject: &str,
        number: &str,
        not_offered: bool,
    ) -> CatalogCourse {
        let offering = InstructionalOffering {
            id: OfferingId::new(),
            session_id: session.id,
            not_offered,
        };
        let course = CourseOffering {
            id: CourseId::new(),
            offering_id: offering.id,
            subject: subject.into(),
            course_number: number.into(),
        };
        let config = ConfigId::new();
        let lecture = make_class(offering.id, config, None, "Lec", "1");
        let labs = vec![
            make_class(offering.id, config, Some(&lecture), "Lab", "1"),
            make_class(offering.id, config, Some(&lecture), "Lab", "2"),
        ];

        let catalog = CatalogCourse {
            course,
            lecture,
            labs,
        };
        self.write(|tx| {
            tx.save_offering(&offering).unwrap();
            tx.save_course(&catalog.course).unwrap();
            tx.save_class(&catalog.lecture).unwrap();
            for lab in &catalog.labs {
                tx.save_class(lab).unwrap();
            }
        })
        .await;
        catalog
    }

    /// Maps a registration number in [`TERM`] to classes of a course.
    pub async fn add_section(&self, crn: u32, course: &CatalogCourse, classes: &[&Class]) {
        let section = RegistrationSection {
            term_code: TERM.into(),
            registration_number: crn,
            course_id: course.id(),
            class_ids: classes.iter().map(|c| c.id).collect(),
        };
        self.write(|tx| tx.save_registration_section(&section).unwrap())
            .await;
    }

    /// Runs `f` in a read-only transaction.
    pub async fn read<T>(&self, f: impl FnOnce(&dyn Transaction) -> T) -> T {
        let tx = self.store.begin().await.unwrap();
        let out = f(&*tx);
        tx.rollback().unwrap();
        out
    }

    /// Runs `f` in a transaction and commits it.
    pub async fn write(&self, f: impl FnOnce(&mut dyn Transaction)) {
        let mut tx = self.store.begin().await.unwrap();
        f(&mut *tx);
        tx.commit().unwrap();
    }

    pub async fn find_student_id(&self, external_id: &str) -> Option<StudentId> {
        self.read(|tx| tx.find_student(self.session.id, external_id).unwrap())
            .await
            .map(|s| s.id)
    }

    pub async fn student_id(&self, external_id: &str) -> StudentId {
        self.find_student_id(external_id)
            .await
            .expect("student exists")
    }

    /// Demands of a student in priority order.
    pub async fn demands(&self, student_id: StudentId) -> Vec<CourseDemand> {
        self.read(|tx| {
            let mut demands = tx.student_demands(student_id).unwrap();
            demands.sort_by(CourseDemand::natural_cmp);
            demands
        })
        .await
    }

    pub async fn requests(&self, demand_id: DemandId) -> Vec<CourseRequest> {
        self.read(|tx| tx.demand_requests(demand_id).unwrap())
            .await
    }

    /// Enrolled class ids of a student, sorted.
    pub async fn enrolled_classes(&self, student_id: StudentId) -> Vec<ClassId> {
        let mut ids: Vec<ClassId> = self
            .read(|tx| {
                tx.student_enrollments(student_id)
                    .unwrap()
                    .into_iter()
                    .map(|e| e.class_id)
                    .collect()
            })
            .await;
        ids.sort();
        ids
    }
}

pub fn make_demand(student_id: StudentId, priority: i32) -> CourseDemand {
    CourseDemand {
        id: DemandId::new(),
        student_id,
        priority,
        alternative: false,
        waitlist: false,
        timestamp: Utc::now(),
    }
}

pub fn make_request(demand_id: DemandId, course_id: CourseId, order: i32) -> CourseRequest {
    CourseRequest {
        id: RequestId::new(),
        demand_id,
        course_id,
        order,
        override_intent: None,
    }
}

/// Whether any log entry of the report contains `text`.
pub fn logged(report: &SyncReport, text: &str) -> bool {
    report.messages.iter().any(|m| m.message.contains(text))
}
