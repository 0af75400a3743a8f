use chrono::Utc;
use pretty_assertions::assert_eq;
use rostersync_store::{Repository, SqliteStore};
use rostersync_types::{
    AcademicArea, AreaId, Class, ClassId, ConfigId, CourseDemand, CourseId, CourseOffering,
    CourseRequest, DemandId, EnrollmentMessage, GroupId, InstructionalOffering, Major, MajorId,
    MessageId, OfferingId, OverrideIntent, OverrideKind, OverrideReservation, RegistrationSection,
    RequestId, ReservationId, ReservationMember, Session, Student, StudentGroup, StudentId,
};
use std::collections::BTreeSet;
use std::time::Duration;

async fn make_store() -> (SqliteStore, Session) {
    let session = Session::new("202410", "PWL");
    let store = SqliteStore::open_in_memory().unwrap();
    let mut tx = store.begin().await.unwrap();
    tx.save_session(&session).unwrap();
    tx.commit().unwrap();
    (store, session)
}

fn make_demand(student_id: StudentId, priority: i32) -> CourseDemand {
    CourseDemand {
        id: DemandId::new(),
        student_id,
        priority,
        alternative: false,
        waitlist: false,
        timestamp: Utc::now(),
    }
}

fn make_reservation(offering_id: OfferingId, class_ids: &[ClassId]) -> OverrideReservation {
    OverrideReservation {
        id: ReservationId::new(),
        offering_id,
        kind: OverrideKind::OverLimit,
        class_ids: class_ids.iter().copied().collect(),
        config_ids: BTreeSet::new(),
    }
}

async fn make_offering(
    store: &SqliteStore,
    session: &Session,
    subject: &str,
    number: &str,
    not_offered: bool,
) -> CourseOffering {
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
    let mut tx = store.begin().await.unwrap();
    tx.save_offering(&offering).unwrap();
    tx.save_course(&course).unwrap();
    tx.commit().unwrap();
    course
}

async fn student_count(store: &SqliteStore, session: &Session, external_ids: &[&str]) -> usize {
    let tx = store.begin().await.unwrap();
    let count = external_ids
        .iter()
        .filter(|id| tx.find_student(session.id, id).unwrap().is_some())
        .count();
    tx.rollback().unwrap();
    count
}

// ── Transactions ─────────────────────────────────────────────────

#[tokio::test]
async fn second_transaction_waits_for_the_first() {
    let (store, session) = make_store().await;
    let student = Student::new(session.id, "S1");

    let mut tx = store.begin().await.unwrap();
    tx.save_student(&student).unwrap();
    assert_eq!(tx.find_student(session.id, "S1").unwrap(), Some(student.clone()));

    let waiting = tokio::time::timeout(Duration::from_millis(50), store.begin()).await;
    assert!(waiting.is_err());

    tx.commit().unwrap();
    let after = store.begin().await.unwrap();
    assert_eq!(after.student(student.id).unwrap(), Some(student));
}

#[tokio::test]
async fn rollback_discards_writes() {
    let (store, session) = make_store().await;

    let mut tx = store.begin().await.unwrap();
    tx.save_student(&Student::new(session.id, "S1")).unwrap();
    tx.rollback().unwrap();

    assert_eq!(student_count(&store, &session, &["S1"]).await, 0);
}

#[tokio::test]
async fn dropped_transaction_discards_writes_and_frees_the_store() {
    let (store, session) = make_store().await;
    {
        let mut tx = store.begin().await.unwrap();
        tx.save_student(&Student::new(session.id, "S1")).unwrap();
    }
    let next = tokio::time::timeout(Duration::from_secs(1), store.begin()).await;
    assert!(next.is_ok());
    drop(next);
    assert_eq!(student_count(&store, &session, &["S1"]).await, 0);
}

#[tokio::test]
async fn deleted_rows_disappear_from_queries() {
    let (store, session) = make_store().await;
    let student = Student::new(session.id, "S1");
    let demand = make_demand(student.id, 0);

    let mut tx = store.begin().await.unwrap();
    tx.save_demand(&demand).unwrap();
    tx.commit().unwrap();

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.student_demands(student.id).unwrap(), vec![demand.clone()]);
    tx.delete_demand(demand.id).unwrap();
    assert!(tx.student_demands(student.id).unwrap().is_empty());
    tx.commit().unwrap();

    let tx = store.begin().await.unwrap();
    assert!(tx.student_demands(student.id).unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transactions_run_one_after_another() {
    let (store, session) = make_store().await;

    let tasks = ["A", "B", "C", "D"].map(|external_id| {
        let store = store.clone();
        let student = Student::new(session.id, external_id);
        tokio::spawn(async move {
            let mut tx = store.begin().await.unwrap();
            tx.save_student(&student).unwrap();
            tokio::task::yield_now().await;
            tx.commit().unwrap();
        })
    });
    for result in futures::future::join_all(tasks).await {
        result.unwrap();
    }

    assert_eq!(student_count(&store, &session, &["A", "B", "C", "D"]).await, 4);
}

#[tokio::test]
async fn saving_again_updates_in_place() {
    let (store, session) = make_store().await;
    let mut student = Student::new(session.id, "S1");

    let mut tx = store.begin().await.unwrap();
    tx.save_student(&student).unwrap();
    student.first_name = Some("Ada".into());
    student.email = Some("ada@example.edu".into());
    tx.save_student(&student).unwrap();
    tx.commit().unwrap();

    let tx = store.begin().await.unwrap();
    assert_eq!(tx.find_student(session.id, "S1").unwrap(), Some(student));
}

// ── Unique keys ──────────────────────────────────────────────────

#[tokio::test]
async fn student_external_id_is_unique_per_session() {
    let (store, session) = make_store().await;
    let other_session = Session::new("202410", "FW");

    let mut tx = store.begin().await.unwrap();
    tx.save_session(&other_session).unwrap();
    tx.save_student(&Student::new(session.id, "S1")).unwrap();
    let err = tx.save_student(&Student::new(session.id, "S1")).unwrap_err();
    assert!(err.is_constraint_violation());

    // The failed statement leaves the transaction usable.
    tx.save_student(&Student::new(other_session.id, "S1")).unwrap();
    tx.commit().unwrap();

    assert_eq!(student_count(&store, &session, &["S1"]).await, 1);
    assert_eq!(student_count(&store, &other_session, &["S1"]).await, 1);
}

#[tokio::test]
async fn group_external_id_is_unique_per_session() {
    let (store, session) = make_store().await;
    let make_group = |external_id: Option<&str>| StudentGroup {
        id: GroupId::new(),
        session_id: session.id,
        external_id: external_id.map(str::to_string),
        abbreviation: "HONORS".into(),
        name: "Honors College".into(),
        type_id: None,
    };

    let mut tx = store.begin().await.unwrap();
    tx.save_group(&make_group(Some("HON"))).unwrap();
    assert!(
        tx.save_group(&make_group(Some("HON")))
            .unwrap_err()
            .is_constraint_violation()
    );
    // Locally created groups have no external id and never collide.
    tx.save_group(&make_group(None)).unwrap();
    tx.save_group(&make_group(None)).unwrap();
    tx.commit().unwrap();
}

#[tokio::test]
async fn identical_reservations_are_rejected() {
    let (store, _session) = make_store().await;
    let offering_id = OfferingId::new();
    let class_id = ClassId::new();

    let mut tx = store.begin().await.unwrap();
    tx.save_reservation(&make_reservation(offering_id, &[class_id]))
        .unwrap();
    let err = tx
        .save_reservation(&make_reservation(offering_id, &[class_id]))
        .unwrap_err();
    assert!(err.is_constraint_violation());
    tx.save_reservation(&make_reservation(offering_id, &[]))
        .unwrap();
    assert_eq!(tx.offering_reservations(offering_id).unwrap().len(), 2);
}

// ── Cascades ─────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_demand_removes_requests_and_messages() {
    let (store, session) = make_store().await;
    let student = Student::new(session.id, "S1");
    let demand = make_demand(student.id, 0);
    let request = CourseRequest {
        id: RequestId::new(),
        demand_id: demand.id,
        course_id: CourseId::new(),
        order: 0,
        override_intent: Some(OverrideIntent::ExternalDrop),
    };
    let message = EnrollmentMessage {
        id: MessageId::new(),
        demand_id: demand.id,
        message: "Not enough space".into(),
    };

    let mut tx = store.begin().await.unwrap();
    tx.save_demand(&demand).unwrap();
    tx.save_request(&request).unwrap();
    tx.save_message(&message).unwrap();
    tx.commit().unwrap();

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.demand_requests(demand.id).unwrap(), vec![request]);
    assert_eq!(tx.demand_messages(demand.id).unwrap(), vec![message]);
    tx.delete_demand(demand.id).unwrap();
    tx.commit().unwrap();

    let tx = store.begin().await.unwrap();
    assert!(tx.student_demands(student.id).unwrap().is_empty());
    assert!(tx.demand_requests(demand.id).unwrap().is_empty());
    assert!(tx.demand_messages(demand.id).unwrap().is_empty());
}

#[tokio::test]
async fn deleting_reservation_removes_members() {
    let (store, _session) = make_store().await;
    let reservation = make_reservation(OfferingId::new(), &[]);
    let member = ReservationMember {
        reservation_id: reservation.id,
        student_id: StudentId::new(),
    };

    let mut tx = store.begin().await.unwrap();
    tx.save_reservation(&reservation).unwrap();
    tx.add_reservation_member(member).unwrap();
    tx.add_reservation_member(member).unwrap();
    assert_eq!(tx.reservation_members(reservation.id).unwrap(), vec![member.student_id]);
    assert_eq!(tx.student_reservations(member.student_id).unwrap(), vec![reservation.clone()]);
    tx.delete_reservation(reservation.id).unwrap();
    tx.commit().unwrap();

    let tx = store.begin().await.unwrap();
    assert_eq!(tx.reservation(reservation.id).unwrap(), None);
    assert!(tx.student_reservations(member.student_id).unwrap().is_empty());
}

// ── Academic programs ────────────────────────────────────────────

#[tokio::test]
async fn majors_are_found_within_their_areas() {
    let (store, session) = make_store().await;
    let area = AcademicArea {
        id: AreaId::new(),
        session_id: session.id,
        external_id: Some("A01".into()),
        abbreviation: "SCI".into(),
        title: "Science".into(),
    };
    let major = Major {
        id: MajorId::new(),
        session_id: session.id,
        external_id: None,
        code: "CS".into(),
        name: "Computer Science".into(),
        area_ids: BTreeSet::from([area.id]),
    };

    let mut tx = store.begin().await.unwrap();
    tx.save_area(&area).unwrap();
    tx.save_major(&major).unwrap();

    assert_eq!(tx.find_area(session.id, "A01").unwrap(), Some(area.clone()));
    assert_eq!(tx.find_area(session.id, "SCI").unwrap(), Some(area.clone()));
    assert_eq!(tx.find_major(session.id, area.id, "CS").unwrap(), Some(major.clone()));
    assert_eq!(tx.find_major(session.id, AreaId::new(), "CS").unwrap(), None);
    assert_eq!(tx.major(major.id).unwrap(), Some(major));
}

// ── Catalog lookups ──────────────────────────────────────────────

#[tokio::test]
async fn registration_number_resolves_course_and_classes() {
    let (store, session) = make_store().await;
    let course = make_offering(&store, &session, "MA", "16100", false).await;
    let class = Class {
        id: ClassId::new(),
        offering_id: course.offering_id,
        config_id: ConfigId::new(),
        parent_id: None,
        subpart: "Lec".into(),
        suffix: "1".into(),
    };
    let section = RegistrationSection {
        term_code: "202410".into(),
        registration_number: 12345,
        course_id: course.id,
        class_ids: vec![class.id],
    };

    let mut tx = store.begin().await.unwrap();
    tx.save_class(&class).unwrap();
    tx.save_registration_section(&section).unwrap();
    tx.commit().unwrap();

    let tx = store.begin().await.unwrap();
    assert_eq!(tx.find_course_by_registration(12345, "202410").unwrap(), Some(course));
    assert_eq!(tx.find_classes_by_registration(12345, "202410").unwrap(), vec![class]);
    assert_eq!(tx.find_course_by_registration(12345, "202420").unwrap(), None);
    assert!(tx.find_classes_by_registration(99999, "202410").unwrap().is_empty());
}

#[tokio::test]
async fn prefix_lookup_skips_courses_not_offered() {
    let (store, session) = make_store().await;
    let offered = make_offering(&store, &session, "CS", "18000", false).await;
    make_offering(&store, &session, "CS", "18200", true).await;
    make_offering(&store, &session, "MA", "18000", false).await;

    let tx = store.begin().await.unwrap();
    let found = tx.find_courses_by_prefix(session.id, "CS", "180").unwrap();
    assert_eq!(found, vec![offered]);
    assert!(tx.find_courses_by_prefix(session.id, "CS", "182").unwrap().is_empty());
    assert!(tx.find_courses_by_prefix(session.id, "CS", "1_0").unwrap().is_empty());
    assert_eq!(tx.offerings().unwrap().len(), 3);
}

// ── Persistence ──────────────────────────────────────────────────

#[tokio::test]
async fn reopened_file_keeps_committed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let session = Session::new("202410", "PWL");
    let demand = make_demand(StudentId::new(), 3);
    {
        let store = SqliteStore::open(&path).unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.save_session(&session).unwrap();
        tx.save_student(&Student::new(session.id, "S1")).unwrap();
        tx.save_demand(&demand).unwrap();
        tx.commit().unwrap();
    }

    let reopened = SqliteStore::open(&path).unwrap();
    let tx = reopened.begin().await.unwrap();
    assert!(tx.find_student(session.id, "S1").unwrap().is_some());
    assert_eq!(tx.find_session_by_term("202410").unwrap(), Some(session));
    assert_eq!(tx.find_session_by_term("202420").unwrap(), None);
    // Timestamps survive with full precision.
    assert_eq!(tx.student_demands(demand.student_id).unwrap(), vec![demand]);
}

#[tokio::test]
async fn copied_store_never_writes_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let session = Session::new("202410", "PWL");
    {
        let store = SqliteStore::open(&path).unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.save_session(&session).unwrap();
        tx.commit().unwrap();
    }

    let copy = SqliteStore::open_copy(&path).unwrap();
    let mut tx = copy.begin().await.unwrap();
    assert_eq!(tx.session(session.id).unwrap(), Some(session.clone()));
    tx.save_student(&Student::new(session.id, "S1")).unwrap();
    tx.commit().unwrap();
    let tx = copy.begin().await.unwrap();
    assert!(tx.find_student(session.id, "S1").unwrap().is_some());
    drop(tx);

    let original = SqliteStore::open(&path).unwrap();
    let tx = original.begin().await.unwrap();
    assert!(tx.find_student(session.id, "S1").unwrap().is_none());
}
