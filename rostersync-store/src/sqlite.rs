//! SQLite-backed repository.
//!
//! One connection behind an async mutex. A transaction owns the connection
//! from `BEGIN IMMEDIATE` until it commits, rolls back or is dropped, so
//! transactions run one after another and each sees everything committed
//! before it started.

use crate::error::StoreResult;
use crate::{Repository, Transaction};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rostersync_types::{
    AcademicArea, AcademicClassification, AcmId, Advisor, AdvisorLink, AreaClassificationMajor,
    AreaId, Class, ClassEnrollment, ClassId, ClassificationId, CourseDemand, CourseId,
    CourseOffering, CourseRequest, DemandId, EnrollmentId, EnrollmentMessage, GroupMembership,
    GroupType, GroupTypeId, InstructionalOffering, Major, MajorId, MessageId, OfferingId,
    OverrideReservation, RegistrationSection, ReservationId, ReservationMember, Role, RoleId,
    Session, SessionId, Student, StudentGroup, StudentId,
};
use rusqlite::backup::Progress;
use rusqlite::types::Type;
use rusqlite::{Connection, DatabaseName, OptionalExtension, Params, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        term_code TEXT NOT NULL,
        academic_initiative TEXT NOT NULL,
        campus TEXT,
        pre_registration INTEGER NOT NULL DEFAULT 0,
        UNIQUE(term_code, academic_initiative)
    );

    CREATE TABLE IF NOT EXISTS students (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        external_id TEXT NOT NULL,
        first_name TEXT,
        middle_name TEXT,
        last_name TEXT,
        email TEXT,
        UNIQUE(session_id, external_id)
    );

    CREATE TABLE IF NOT EXISTS areas (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        external_id TEXT,
        abbreviation TEXT NOT NULL,
        title TEXT NOT NULL,
        UNIQUE(session_id, abbreviation)
    );

    CREATE TABLE IF NOT EXISTS classifications (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        external_id TEXT,
        code TEXT NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(session_id, code)
    );

    CREATE TABLE IF NOT EXISTS majors (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        external_id TEXT,
        code TEXT NOT NULL,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS major_areas (
        major_id TEXT NOT NULL,
        area_id TEXT NOT NULL,
        PRIMARY KEY(major_id, area_id)
    );

    CREATE TABLE IF NOT EXISTS programs (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL,
        area_id TEXT NOT NULL,
        classification_id TEXT NOT NULL,
        major_id TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS group_types (
        id TEXT PRIMARY KEY,
        reference TEXT NOT NULL UNIQUE,
        label TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS student_groups (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        external_id TEXT,
        abbreviation TEXT NOT NULL,
        name TEXT NOT NULL,
        type_id TEXT,
        UNIQUE(session_id, external_id)
    );

    CREATE TABLE IF NOT EXISTS group_members (
        group_id TEXT NOT NULL,
        student_id TEXT NOT NULL,
        PRIMARY KEY(group_id, student_id)
    );

    CREATE TABLE IF NOT EXISTS roles (
        id TEXT PRIMARY KEY,
        reference TEXT NOT NULL UNIQUE,
        label TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS advisors (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        external_id TEXT NOT NULL,
        role_id TEXT NOT NULL,
        first_name TEXT,
        middle_name TEXT,
        last_name TEXT,
        email TEXT,
        academic_title TEXT,
        UNIQUE(session_id, external_id, role_id)
    );

    CREATE TABLE IF NOT EXISTS advisor_links (
        advisor_id TEXT NOT NULL,
        student_id TEXT NOT NULL,
        PRIMARY KEY(advisor_id, student_id)
    );

    CREATE TABLE IF NOT EXISTS offerings (
        id TEXT PRIMARY KEY,
        session_id TEXT NOT NULL,
        not_offered INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS courses (
        id TEXT PRIMARY KEY,
        offering_id TEXT NOT NULL,
        subject TEXT NOT NULL,
        course_number TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS classes (
        id TEXT PRIMARY KEY,
        offering_id TEXT NOT NULL,
        config_id TEXT NOT NULL,
        parent_id TEXT,
        subpart TEXT NOT NULL,
        suffix TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS registration_sections (
        term_code TEXT NOT NULL,
        registration_number INTEGER NOT NULL,
        course_id TEXT NOT NULL,
        class_ids TEXT NOT NULL,
        PRIMARY KEY(term_code, registration_number)
    );

    CREATE TABLE IF NOT EXISTS demands (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL,
        priority INTEGER NOT NULL,
        alternative INTEGER NOT NULL,
        waitlist INTEGER NOT NULL,
        timestamp TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS requests (
        id TEXT PRIMARY KEY,
        demand_id TEXT NOT NULL,
        course_id TEXT NOT NULL,
        request_order INTEGER NOT NULL,
        override_intent TEXT
    );

    CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        demand_id TEXT NOT NULL,
        message TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS enrollments (
        id TEXT PRIMARY KEY,
        student_id TEXT NOT NULL,
        course_id TEXT NOT NULL,
        class_id TEXT NOT NULL,
        request_id TEXT,
        timestamp TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS reservations (
        id TEXT PRIMARY KEY,
        offering_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        class_ids TEXT NOT NULL,
        config_ids TEXT NOT NULL,
        UNIQUE(offering_id, kind, class_ids, config_ids)
    );

    CREATE TABLE IF NOT EXISTS reservation_members (
        reservation_id TEXT NOT NULL,
        student_id TEXT NOT NULL,
        PRIMARY KEY(reservation_id, student_id)
    );

    CREATE INDEX IF NOT EXISTS idx_programs_student ON programs(student_id);
    CREATE INDEX IF NOT EXISTS idx_group_members_student ON group_members(student_id);
    CREATE INDEX IF NOT EXISTS idx_advisor_links_student ON advisor_links(student_id);
    CREATE INDEX IF NOT EXISTS idx_courses_offering ON courses(offering_id);
    CREATE INDEX IF NOT EXISTS idx_classes_offering ON classes(offering_id);
    CREATE INDEX IF NOT EXISTS idx_demands_student ON demands(student_id);
    CREATE INDEX IF NOT EXISTS idx_requests_demand ON requests(demand_id);
    CREATE INDEX IF NOT EXISTS idx_messages_demand ON messages(demand_id);
    CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments(student_id);
    CREATE INDEX IF NOT EXISTS idx_reservations_offering ON reservations(offering_id);
    CREATE INDEX IF NOT EXISTS idx_reservation_members_student ON reservation_members(student_id);
";

const SESSION_COLUMNS: &str = "id, term_code, academic_initiative, campus, pre_registration";
const STUDENT_COLUMNS: &str =
    "id, session_id, external_id, first_name, middle_name, last_name, email";
const AREA_COLUMNS: &str = "id, session_id, external_id, abbreviation, title";
const CLASSIFICATION_COLUMNS: &str = "id, session_id, external_id, code, name";
const MAJOR_COLUMNS: &str = "id, session_id, external_id, code, name";
const PROGRAM_COLUMNS: &str = "id, student_id, area_id, classification_id, major_id";
const GROUP_COLUMNS: &str = "id, session_id, external_id, abbreviation, name, type_id";
const ADVISOR_COLUMNS: &str = "id, session_id, external_id, role_id, first_name, middle_name, \
     last_name, email, academic_title";
const OFFERING_COLUMNS: &str = "id, session_id, not_offered";
const COURSE_COLUMNS: &str = "id, offering_id, subject, course_number";
const CLASS_COLUMNS: &str = "id, offering_id, config_id, parent_id, subpart, suffix";
const DEMAND_COLUMNS: &str = "id, student_id, priority, alternative, waitlist, timestamp";
const REQUEST_COLUMNS: &str = "id, demand_id, course_id, request_order, override_intent";
const ENROLLMENT_COLUMNS: &str = "id, student_id, course_id, class_id, request_id, timestamp";
const RESERVATION_COLUMNS: &str = "id, offering_id, kind, class_ids, config_ids";

/// Repository persisted in a SQLite database.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        debug!("Opened store {}", path.display());
        Self::with_connection(conn)
    }

    /// Opens an in-memory copy of the store at `path`. Commits never reach
    /// the file.
    pub fn open_copy(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open_in_memory()?;
        conn.restore(DatabaseName::Main, path, None::<fn(Progress)>)?;
        debug!("Copied store {} into memory", path.display());
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl Repository for SqliteStore {
    async fn begin(&self) -> StoreResult<Box<dyn Transaction + '_>> {
        let conn = Arc::clone(&self.conn).lock_owned().await;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Box::new(SqliteTransaction {
            conn,
            finished: false,
        }))
    }
}

/// Open SQLite transaction holding the store's connection.
struct SqliteTransaction {
    conn: OwnedMutexGuard<Connection>,
    finished: bool,
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                warn!("Failed to roll back dropped transaction: {e}");
            }
        }
    }
}

// ── Column conversions ───────────────────────────────────────────

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| conversion_error(idx, e))
}

fn parsed_opt<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|t| t.parse().map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(idx, e))
}

fn json_opt<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| serde_json::from_str(&t).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn timestamp_text(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn to_json<T: Serialize>(value: &T) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn id_text<T: ToString>(id: Option<T>) -> Option<String> {
    id.map(|id| id.to_string())
}

// ── Row mapping ──────────────────────────────────────────────────

fn session_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: parsed(row, 0)?,
        term_code: row.get(1)?,
        academic_initiative: row.get(2)?,
        campus: row.get(3)?,
        pre_registration: row.get(4)?,
    })
}

fn student_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: parsed(row, 0)?,
        session_id: parsed(row, 1)?,
        external_id: row.get(2)?,
        first_name: row.get(3)?,
        middle_name: row.get(4)?,
        last_name: row.get(5)?,
        email: row.get(6)?,
    })
}

fn area_row(row: &Row<'_>) -> rusqlite::Result<AcademicArea> {
    Ok(AcademicArea {
        id: parsed(row, 0)?,
        session_id: parsed(row, 1)?,
        external_id: row.get(2)?,
        abbreviation: row.get(3)?,
        title: row.get(4)?,
    })
}

fn classification_row(row: &Row<'_>) -> rusqlite::Result<AcademicClassification> {
    Ok(AcademicClassification {
        id: parsed(row, 0)?,
        session_id: parsed(row, 1)?,
        external_id: row.get(2)?,
        code: row.get(3)?,
        name: row.get(4)?,
    })
}

/// Major without its areas; see [`SqliteTransaction::with_areas`].
fn major_row(row: &Row<'_>) -> rusqlite::Result<Major> {
    Ok(Major {
        id: parsed(row, 0)?,
        session_id: parsed(row, 1)?,
        external_id: row.get(2)?,
        code: row.get(3)?,
        name: row.get(4)?,
        area_ids: Default::default(),
    })
}

fn program_row(row: &Row<'_>) -> rusqlite::Result<AreaClassificationMajor> {
    Ok(AreaClassificationMajor {
        id: parsed(row, 0)?,
        student_id: parsed(row, 1)?,
        area_id: parsed(row, 2)?,
        classification_id: parsed(row, 3)?,
        major_id: parsed(row, 4)?,
    })
}

fn group_type_row(row: &Row<'_>) -> rusqlite::Result<GroupType> {
    Ok(GroupType {
        id: parsed(row, 0)?,
        reference: row.get(1)?,
        label: row.get(2)?,
    })
}

fn group_row(row: &Row<'_>) -> rusqlite::Result<StudentGroup> {
    Ok(StudentGroup {
        id: parsed(row, 0)?,
        session_id: parsed(row, 1)?,
        external_id: row.get(2)?,
        abbreviation: row.get(3)?,
        name: row.get(4)?,
        type_id: parsed_opt(row, 5)?,
    })
}

fn role_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: parsed(row, 0)?,
        reference: row.get(1)?,
        label: row.get(2)?,
    })
}

fn advisor_row(row: &Row<'_>) -> rusqlite::Result<Advisor> {
    Ok(Advisor {
        id: parsed(row, 0)?,
        session_id: parsed(row, 1)?,
        external_id: row.get(2)?,
        role_id: parsed(row, 3)?,
        first_name: row.get(4)?,
        middle_name: row.get(5)?,
        last_name: row.get(6)?,
        email: row.get(7)?,
        academic_title: row.get(8)?,
    })
}

fn offering_row(row: &Row<'_>) -> rusqlite::Result<InstructionalOffering> {
    Ok(InstructionalOffering {
        id: parsed(row, 0)?,
        session_id: parsed(row, 1)?,
        not_offered: row.get(2)?,
    })
}

fn course_row(row: &Row<'_>) -> rusqlite::Result<CourseOffering> {
    Ok(CourseOffering {
        id: parsed(row, 0)?,
        offering_id: parsed(row, 1)?,
        subject: row.get(2)?,
        course_number: row.get(3)?,
    })
}

fn class_row(row: &Row<'_>) -> rusqlite::Result<Class> {
    Ok(Class {
        id: parsed(row, 0)?,
        offering_id: parsed(row, 1)?,
        config_id: parsed(row, 2)?,
        parent_id: parsed_opt(row, 3)?,
        subpart: row.get(4)?,
        suffix: row.get(5)?,
    })
}

fn demand_row(row: &Row<'_>) -> rusqlite::Result<CourseDemand> {
    Ok(CourseDemand {
        id: parsed(row, 0)?,
        student_id: parsed(row, 1)?,
        priority: row.get(2)?,
        alternative: row.get(3)?,
        waitlist: row.get(4)?,
        timestamp: timestamp(row, 5)?,
    })
}

fn request_row(row: &Row<'_>) -> rusqlite::Result<CourseRequest> {
    Ok(CourseRequest {
        id: parsed(row, 0)?,
        demand_id: parsed(row, 1)?,
        course_id: parsed(row, 2)?,
        order: row.get(3)?,
        override_intent: json_opt(row, 4)?,
    })
}

fn message_row(row: &Row<'_>) -> rusqlite::Result<EnrollmentMessage> {
    Ok(EnrollmentMessage {
        id: parsed(row, 0)?,
        demand_id: parsed(row, 1)?,
        message: row.get(2)?,
    })
}

fn enrollment_row(row: &Row<'_>) -> rusqlite::Result<ClassEnrollment> {
    Ok(ClassEnrollment {
        id: parsed(row, 0)?,
        student_id: parsed(row, 1)?,
        course_id: parsed(row, 2)?,
        class_id: parsed(row, 3)?,
        request_id: parsed_opt(row, 4)?,
        timestamp: timestamp(row, 5)?,
    })
}

fn reservation_row(row: &Row<'_>) -> rusqlite::Result<OverrideReservation> {
    Ok(OverrideReservation {
        id: parsed(row, 0)?,
        offering_id: parsed(row, 1)?,
        kind: parsed(row, 2)?,
        class_ids: json(row, 3)?,
        config_ids: json(row, 4)?,
    })
}

impl SqliteTransaction {
    fn query_one<T, P, F>(&self, sql: &str, params: P, map: F) -> StoreResult<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        Ok(self.conn.query_row(sql, params, map).optional()?)
    }

    fn query_all<T, P, F>(&self, sql: &str, params: P, map: F) -> StoreResult<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn with_areas(&self, mut major: Major) -> StoreResult<Major> {
        major.area_ids = self
            .query_all(
                "SELECT area_id FROM major_areas WHERE major_id = ?1",
                params![major.id.to_string()],
                |row| parsed::<AreaId>(row, 0),
            )?
            .into_iter()
            .collect();
        Ok(major)
    }

    fn registration_section(
        &self,
        registration_number: u32,
        term_code: &str,
    ) -> StoreResult<Option<RegistrationSection>> {
        self.query_one(
            "SELECT term_code, registration_number, course_id, class_ids \
             FROM registration_sections WHERE term_code = ?1 AND registration_number = ?2",
            params![term_code, registration_number],
            |row| {
                Ok(RegistrationSection {
                    term_code: row.get(0)?,
                    registration_number: row.get(1)?,
                    course_id: parsed(row, 2)?,
                    class_ids: json(row, 3)?,
                })
            },
        )
    }

    fn finish(&mut self, statement: &str) -> StoreResult<()> {
        self.conn.execute_batch(statement)?;
        self.finished = true;
        Ok(())
    }
}

impl Transaction for SqliteTransaction {
    // ── Sessions & students ──────────────────────────────────────

    fn session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        self.query_one(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
            params![id.to_string()],
            session_row,
        )
    }

    fn find_session_by_term(&self, term_code: &str) -> StoreResult<Option<Session>> {
        self.query_one(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE term_code = ?1 ORDER BY id LIMIT 1"
            ),
            params![term_code],
            session_row,
        )
    }

    fn save_session(&mut self, session: &Session) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO sessions (id, term_code, academic_initiative, campus, pre_registration)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET term_code = ?2, academic_initiative = ?3,
                 campus = ?4, pre_registration = ?5",
            params![
                session.id.to_string(),
                session.term_code,
                session.academic_initiative,
                session.campus,
                session.pre_registration,
            ],
        )?;
        Ok(())
    }

    fn find_student(
        &self,
        session_id: SessionId,
        external_id: &str,
    ) -> StoreResult<Option<Student>> {
        self.query_one(
            &format!(
                "SELECT {STUDENT_COLUMNS} FROM students WHERE session_id = ?1 AND external_id = ?2"
            ),
            params![session_id.to_string(), external_id],
            student_row,
        )
    }

    fn student(&self, id: StudentId) -> StoreResult<Option<Student>> {
        self.query_one(
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
            params![id.to_string()],
            student_row,
        )
    }

    fn save_student(&mut self, student: &Student) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO students (id, session_id, external_id, first_name, middle_name, last_name, email)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET session_id = ?2, external_id = ?3, first_name = ?4,
                 middle_name = ?5, last_name = ?6, email = ?7",
            params![
                student.id.to_string(),
                student.session_id.to_string(),
                student.external_id,
                student.first_name,
                student.middle_name,
                student.last_name,
                student.email,
            ],
        )?;
        Ok(())
    }

    // ── Academic programs ────────────────────────────────────────

    fn student_programs(&self, student_id: StudentId) -> StoreResult<Vec<AreaClassificationMajor>> {
        self.query_all(
            &format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE student_id = ?1 ORDER BY id"),
            params![student_id.to_string()],
            program_row,
        )
    }

    fn area(&self, id: AreaId) -> StoreResult<Option<AcademicArea>> {
        self.query_one(
            &format!("SELECT {AREA_COLUMNS} FROM areas WHERE id = ?1"),
            params![id.to_string()],
            area_row,
        )
    }

    fn classification(&self, id: ClassificationId) -> StoreResult<Option<AcademicClassification>> {
        self.query_one(
            &format!("SELECT {CLASSIFICATION_COLUMNS} FROM classifications WHERE id = ?1"),
            params![id.to_string()],
            classification_row,
        )
    }

    fn major(&self, id: MajorId) -> StoreResult<Option<Major>> {
        self.query_one(
            &format!("SELECT {MAJOR_COLUMNS} FROM majors WHERE id = ?1"),
            params![id.to_string()],
            major_row,
        )?
        .map(|major| self.with_areas(major))
        .transpose()
    }

    fn find_area(&self, session_id: SessionId, key: &str) -> StoreResult<Option<AcademicArea>> {
        let by_external = self.query_one(
            &format!(
                "SELECT {AREA_COLUMNS} FROM areas WHERE session_id = ?1 AND external_id = ?2 \
                 ORDER BY id LIMIT 1"
            ),
            params![session_id.to_string(), key],
            area_row,
        )?;
        if by_external.is_some() {
            return Ok(by_external);
        }
        self.query_one(
            &format!("SELECT {AREA_COLUMNS} FROM areas WHERE session_id = ?1 AND abbreviation = ?2"),
            params![session_id.to_string(), key],
            area_row,
        )
    }

    fn find_classification(
        &self,
        session_id: SessionId,
        key: &str,
    ) -> StoreResult<Option<AcademicClassification>> {
        let by_external = self.query_one(
            &format!(
                "SELECT {CLASSIFICATION_COLUMNS} FROM classifications \
                 WHERE session_id = ?1 AND external_id = ?2 ORDER BY id LIMIT 1"
            ),
            params![session_id.to_string(), key],
            classification_row,
        )?;
        if by_external.is_some() {
            return Ok(by_external);
        }
        self.query_one(
            &format!(
                "SELECT {CLASSIFICATION_COLUMNS} FROM classifications \
                 WHERE session_id = ?1 AND code = ?2"
            ),
            params![session_id.to_string(), key],
            classification_row,
        )
    }

    fn find_major(
        &self,
        session_id: SessionId,
        area_id: AreaId,
        key: &str,
    ) -> StoreResult<Option<Major>> {
        let in_area = "session_id = ?1 AND id IN (SELECT major_id FROM major_areas WHERE area_id = ?2)";
        let by_external = self.query_one(
            &format!(
                "SELECT {MAJOR_COLUMNS} FROM majors WHERE {in_area} AND external_id = ?3 \
                 ORDER BY id LIMIT 1"
            ),
            params![session_id.to_string(), area_id.to_string(), key],
            major_row,
        )?;
        let major = match by_external {
            Some(major) => Some(major),
            None => self.query_one(
                &format!(
                    "SELECT {MAJOR_COLUMNS} FROM majors WHERE {in_area} AND code = ?3 \
                     ORDER BY id LIMIT 1"
                ),
                params![session_id.to_string(), area_id.to_string(), key],
                major_row,
            )?,
        };
        major.map(|major| self.with_areas(major)).transpose()
    }

    fn save_area(&mut self, area: &AcademicArea) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO areas (id, session_id, external_id, abbreviation, title)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET session_id = ?2, external_id = ?3,
                 abbreviation = ?4, title = ?5",
            params![
                area.id.to_string(),
                area.session_id.to_string(),
                area.external_id,
                area.abbreviation,
                area.title,
            ],
        )?;
        Ok(())
    }

    fn save_classification(&mut self, classification: &AcademicClassification) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO classifications (id, session_id, external_id, code, name)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET session_id = ?2, external_id = ?3, code = ?4, name = ?5",
            params![
                classification.id.to_string(),
                classification.session_id.to_string(),
                classification.external_id,
                classification.code,
                classification.name,
            ],
        )?;
        Ok(())
    }

    fn save_major(&mut self, major: &Major) -> StoreResult<()> {
        let id = major.id.to_string();
        self.conn.execute(
            "INSERT INTO majors (id, session_id, external_id, code, name)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET session_id = ?2, external_id = ?3, code = ?4, name = ?5",
            params![
                id,
                major.session_id.to_string(),
                major.external_id,
                major.code,
                major.name,
            ],
        )?;
        self.conn
            .execute("DELETE FROM major_areas WHERE major_id = ?1", params![id])?;
        for area_id in &major.area_ids {
            self.conn.execute(
                "INSERT INTO major_areas (major_id, area_id) VALUES (?1, ?2)",
                params![id, area_id.to_string()],
            )?;
        }
        Ok(())
    }

    fn save_program(&mut self, program: &AreaClassificationMajor) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO programs (id, student_id, area_id, classification_id, major_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET student_id = ?2, area_id = ?3,
                 classification_id = ?4, major_id = ?5",
            params![
                program.id.to_string(),
                program.student_id.to_string(),
                program.area_id.to_string(),
                program.classification_id.to_string(),
                program.major_id.to_string(),
            ],
        )?;
        Ok(())
    }

    fn delete_program(&mut self, id: AcmId) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM programs WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    // ── Groups ───────────────────────────────────────────────────

    fn student_groups(&self, student_id: StudentId) -> StoreResult<Vec<StudentGroup>> {
        self.query_all(
            &format!(
                "SELECT {GROUP_COLUMNS} FROM student_groups WHERE id IN \
                 (SELECT group_id FROM group_members WHERE student_id = ?1) ORDER BY id"
            ),
            params![student_id.to_string()],
            group_row,
        )
    }

    fn find_group(
        &self,
        session_id: SessionId,
        external_id: &str,
    ) -> StoreResult<Option<StudentGroup>> {
        self.query_one(
            &format!("SELECT {GROUP_COLUMNS} FROM student_groups WHERE session_id = ?1 AND external_id = ?2"),
            params![session_id.to_string(), external_id],
            group_row,
        )
    }

    fn save_group(&mut self, group: &StudentGroup) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO student_groups (id, session_id, external_id, abbreviation, name, type_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET session_id = ?2, external_id = ?3,
                 abbreviation = ?4, name = ?5, type_id = ?6",
            params![
                group.id.to_string(),
                group.session_id.to_string(),
                group.external_id,
                group.abbreviation,
                group.name,
                id_text(group.type_id),
            ],
        )?;
        Ok(())
    }

    fn group_type(&self, id: GroupTypeId) -> StoreResult<Option<GroupType>> {
        self.query_one(
            "SELECT id, reference, label FROM group_types WHERE id = ?1",
            params![id.to_string()],
            group_type_row,
        )
    }

    fn find_group_type(&self, reference: &str) -> StoreResult<Option<GroupType>> {
        self.query_one(
            "SELECT id, reference, label FROM group_types WHERE reference = ?1",
            params![reference],
            group_type_row,
        )
    }

    fn save_group_type(&mut self, group_type: &GroupType) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO group_types (id, reference, label) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET reference = ?2, label = ?3",
            params![group_type.id.to_string(), group_type.reference, group_type.label],
        )?;
        Ok(())
    }

    fn add_group_member(&mut self, membership: GroupMembership) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO group_members (group_id, student_id) VALUES (?1, ?2)",
            params![membership.group_id.to_string(), membership.student_id.to_string()],
        )?;
        Ok(())
    }

    fn remove_group_member(&mut self, membership: GroupMembership) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM group_members WHERE group_id = ?1 AND student_id = ?2",
            params![membership.group_id.to_string(), membership.student_id.to_string()],
        )?;
        Ok(())
    }

    // ── Advisors ─────────────────────────────────────────────────

    fn role(&self, id: RoleId) -> StoreResult<Option<Role>> {
        self.query_one(
            "SELECT id, reference, label FROM roles WHERE id = ?1",
            params![id.to_string()],
            role_row,
        )
    }

    fn find_role(&self, reference: &str) -> StoreResult<Option<Role>> {
        self.query_one(
            "SELECT id, reference, label FROM roles WHERE reference = ?1",
            params![reference],
            role_row,
        )
    }

    fn save_role(&mut self, role: &Role) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO roles (id, reference, label) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET reference = ?2, label = ?3",
            params![role.id.to_string(), role.reference, role.label],
        )?;
        Ok(())
    }

    fn student_advisors(&self, student_id: StudentId) -> StoreResult<Vec<Advisor>> {
        self.query_all(
            &format!(
                "SELECT {ADVISOR_COLUMNS} FROM advisors WHERE id IN \
                 (SELECT advisor_id FROM advisor_links WHERE student_id = ?1) ORDER BY id"
            ),
            params![student_id.to_string()],
            advisor_row,
        )
    }

    fn find_advisor(
        &self,
        session_id: SessionId,
        external_id: &str,
        role_id: RoleId,
    ) -> StoreResult<Option<Advisor>> {
        self.query_one(
            &format!(
                "SELECT {ADVISOR_COLUMNS} FROM advisors \
                 WHERE session_id = ?1 AND external_id = ?2 AND role_id = ?3"
            ),
            params![session_id.to_string(), external_id, role_id.to_string()],
            advisor_row,
        )
    }

    fn save_advisor(&mut self, advisor: &Advisor) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO advisors (id, session_id, external_id, role_id, first_name, middle_name,
                 last_name, email, academic_title)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET session_id = ?2, external_id = ?3, role_id = ?4,
                 first_name = ?5, middle_name = ?6, last_name = ?7, email = ?8,
                 academic_title = ?9",
            params![
                advisor.id.to_string(),
                advisor.session_id.to_string(),
                advisor.external_id,
                advisor.role_id.to_string(),
                advisor.first_name,
                advisor.middle_name,
                advisor.last_name,
                advisor.email,
                advisor.academic_title,
            ],
        )?;
        Ok(())
    }

    fn add_advisor_link(&mut self, link: AdvisorLink) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO advisor_links (advisor_id, student_id) VALUES (?1, ?2)",
            params![link.advisor_id.to_string(), link.student_id.to_string()],
        )?;
        Ok(())
    }

    fn remove_advisor_link(&mut self, link: AdvisorLink) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM advisor_links WHERE advisor_id = ?1 AND student_id = ?2",
            params![link.advisor_id.to_string(), link.student_id.to_string()],
        )?;
        Ok(())
    }

    // ── Course catalog ───────────────────────────────────────────

    fn offerings(&self) -> StoreResult<Vec<InstructionalOffering>> {
        self.query_all(
            &format!("SELECT {OFFERING_COLUMNS} FROM offerings ORDER BY id"),
            [],
            offering_row,
        )
    }

    fn offering(&self, id: OfferingId) -> StoreResult<Option<InstructionalOffering>> {
        self.query_one(
            &format!("SELECT {OFFERING_COLUMNS} FROM offerings WHERE id = ?1"),
            params![id.to_string()],
            offering_row,
        )
    }

    fn save_offering(&mut self, offering: &InstructionalOffering) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO offerings (id, session_id, not_offered) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET session_id = ?2, not_offered = ?3",
            params![
                offering.id.to_string(),
                offering.session_id.to_string(),
                offering.not_offered,
            ],
        )?;
        Ok(())
    }

    fn course(&self, id: CourseId) -> StoreResult<Option<CourseOffering>> {
        self.query_one(
            &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1"),
            params![id.to_string()],
            course_row,
        )
    }

    fn save_course(&mut self, course: &CourseOffering) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO courses (id, offering_id, subject, course_number) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET offering_id = ?2, subject = ?3, course_number = ?4",
            params![
                course.id.to_string(),
                course.offering_id.to_string(),
                course.subject,
                course.course_number,
            ],
        )?;
        Ok(())
    }

    fn class(&self, id: ClassId) -> StoreResult<Option<Class>> {
        self.query_one(
            &format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = ?1"),
            params![id.to_string()],
            class_row,
        )
    }

    fn save_class(&mut self, class: &Class) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO classes (id, offering_id, config_id, parent_id, subpart, suffix)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET offering_id = ?2, config_id = ?3, parent_id = ?4,
                 subpart = ?5, suffix = ?6",
            params![
                class.id.to_string(),
                class.offering_id.to_string(),
                class.config_id.to_string(),
                id_text(class.parent_id),
                class.subpart,
                class.suffix,
            ],
        )?;
        Ok(())
    }

    fn offering_classes(&self, offering_id: OfferingId) -> StoreResult<Vec<Class>> {
        self.query_all(
            &format!("SELECT {CLASS_COLUMNS} FROM classes WHERE offering_id = ?1 ORDER BY id"),
            params![offering_id.to_string()],
            class_row,
        )
    }

    fn offering_courses(&self, offering_id: OfferingId) -> StoreResult<Vec<CourseOffering>> {
        self.query_all(
            &format!("SELECT {COURSE_COLUMNS} FROM courses WHERE offering_id = ?1 ORDER BY id"),
            params![offering_id.to_string()],
            course_row,
        )
    }

    fn save_registration_section(&mut self, section: &RegistrationSection) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO registration_sections
                 (term_code, registration_number, course_id, class_ids)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                section.term_code,
                section.registration_number,
                section.course_id.to_string(),
                to_json(&section.class_ids)?,
            ],
        )?;
        Ok(())
    }

    fn find_course_by_registration(
        &self,
        registration_number: u32,
        term_code: &str,
    ) -> StoreResult<Option<CourseOffering>> {
        match self.registration_section(registration_number, term_code)? {
            Some(section) => self.course(section.course_id),
            None => Ok(None),
        }
    }

    fn find_classes_by_registration(
        &self,
        registration_number: u32,
        term_code: &str,
    ) -> StoreResult<Vec<Class>> {
        let Some(section) = self.registration_section(registration_number, term_code)? else {
            return Ok(Vec::new());
        };
        let mut classes = Vec::with_capacity(section.class_ids.len());
        for id in section.class_ids {
            if let Some(class) = self.class(id)? {
                classes.push(class);
            }
        }
        Ok(classes)
    }

    fn find_courses_by_prefix(
        &self,
        session_id: SessionId,
        subject: &str,
        course_prefix: &str,
    ) -> StoreResult<Vec<CourseOffering>> {
        // substr keeps the prefix literal; LIKE would treat % and _ as wildcards.
        self.query_all(
            &format!(
                "SELECT {COURSE_COLUMNS} FROM courses
                 WHERE subject = ?2
                   AND substr(course_number, 1, length(?3)) = ?3
                   AND offering_id IN
                       (SELECT id FROM offerings WHERE session_id = ?1 AND not_offered = 0)
                 ORDER BY id"
            ),
            params![session_id.to_string(), subject, course_prefix],
            course_row,
        )
    }

    // ── Course demands & enrollments ─────────────────────────────

    fn student_demands(&self, student_id: StudentId) -> StoreResult<Vec<CourseDemand>> {
        self.query_all(
            &format!("SELECT {DEMAND_COLUMNS} FROM demands WHERE student_id = ?1 ORDER BY id"),
            params![student_id.to_string()],
            demand_row,
        )
    }

    fn demand_requests(&self, demand_id: DemandId) -> StoreResult<Vec<CourseRequest>> {
        self.query_all(
            &format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE demand_id = ?1 ORDER BY id"),
            params![demand_id.to_string()],
            request_row,
        )
    }

    fn save_demand(&mut self, demand: &CourseDemand) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO demands (id, student_id, priority, alternative, waitlist, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET student_id = ?2, priority = ?3, alternative = ?4,
                 waitlist = ?5, timestamp = ?6",
            params![
                demand.id.to_string(),
                demand.student_id.to_string(),
                demand.priority,
                demand.alternative,
                demand.waitlist,
                timestamp_text(&demand.timestamp),
            ],
        )?;
        Ok(())
    }

    fn delete_demand(&mut self, id: DemandId) -> StoreResult<()> {
        let id = id.to_string();
        self.conn
            .execute("DELETE FROM requests WHERE demand_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM messages WHERE demand_id = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM demands WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn save_request(&mut self, request: &CourseRequest) -> StoreResult<()> {
        let intent = request.override_intent.as_ref().map(to_json).transpose()?;
        self.conn.execute(
            "INSERT INTO requests (id, demand_id, course_id, request_order, override_intent)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET demand_id = ?2, course_id = ?3, request_order = ?4,
                 override_intent = ?5",
            params![
                request.id.to_string(),
                request.demand_id.to_string(),
                request.course_id.to_string(),
                request.order,
                intent,
            ],
        )?;
        Ok(())
    }

    fn demand_messages(&self, demand_id: DemandId) -> StoreResult<Vec<EnrollmentMessage>> {
        self.query_all(
            "SELECT id, demand_id, message FROM messages WHERE demand_id = ?1 ORDER BY id",
            params![demand_id.to_string()],
            message_row,
        )
    }

    fn save_message(&mut self, message: &EnrollmentMessage) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO messages (id, demand_id, message) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET demand_id = ?2, message = ?3",
            params![
                message.id.to_string(),
                message.demand_id.to_string(),
                message.message,
            ],
        )?;
        Ok(())
    }

    fn delete_message(&mut self, id: MessageId) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM messages WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    fn student_enrollments(&self, student_id: StudentId) -> StoreResult<Vec<ClassEnrollment>> {
        self.query_all(
            &format!(
                "SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE student_id = ?1 ORDER BY id"
            ),
            params![student_id.to_string()],
            enrollment_row,
        )
    }

    fn save_enrollment(&mut self, enrollment: &ClassEnrollment) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO enrollments (id, student_id, course_id, class_id, request_id, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET student_id = ?2, course_id = ?3, class_id = ?4,
                 request_id = ?5, timestamp = ?6",
            params![
                enrollment.id.to_string(),
                enrollment.student_id.to_string(),
                enrollment.course_id.to_string(),
                enrollment.class_id.to_string(),
                id_text(enrollment.request_id),
                timestamp_text(&enrollment.timestamp),
            ],
        )?;
        Ok(())
    }

    fn delete_enrollment(&mut self, id: EnrollmentId) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM enrollments WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    // ── Override reservations ────────────────────────────────────

    fn reservation(&self, id: ReservationId) -> StoreResult<Option<OverrideReservation>> {
        self.query_one(
            &format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?1"),
            params![id.to_string()],
            reservation_row,
        )
    }

    fn offering_reservations(
        &self,
        offering_id: OfferingId,
    ) -> StoreResult<Vec<OverrideReservation>> {
        self.query_all(
            &format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE offering_id = ?1 ORDER BY id"
            ),
            params![offering_id.to_string()],
            reservation_row,
        )
    }

    fn student_reservations(&self, student_id: StudentId) -> StoreResult<Vec<OverrideReservation>> {
        self.query_all(
            &format!(
                "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id IN \
                 (SELECT reservation_id FROM reservation_members WHERE student_id = ?1) ORDER BY id"
            ),
            params![student_id.to_string()],
            reservation_row,
        )
    }

    fn reservation_members(&self, reservation_id: ReservationId) -> StoreResult<Vec<StudentId>> {
        self.query_all(
            "SELECT student_id FROM reservation_members WHERE reservation_id = ?1 ORDER BY student_id",
            params![reservation_id.to_string()],
            |row| parsed(row, 0),
        )
    }

    fn save_reservation(&mut self, reservation: &OverrideReservation) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO reservations (id, offering_id, kind, class_ids, config_ids)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET offering_id = ?2, kind = ?3, class_ids = ?4,
                 config_ids = ?5",
            params![
                reservation.id.to_string(),
                reservation.offering_id.to_string(),
                reservation.kind.to_string(),
                to_json(&reservation.class_ids)?,
                to_json(&reservation.config_ids)?,
            ],
        )?;
        Ok(())
    }

    fn delete_reservation(&mut self, id: ReservationId) -> StoreResult<()> {
        let id = id.to_string();
        self.conn.execute(
            "DELETE FROM reservation_members WHERE reservation_id = ?1",
            params![id],
        )?;
        self.conn
            .execute("DELETE FROM reservations WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn add_reservation_member(&mut self, member: ReservationMember) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO reservation_members (reservation_id, student_id) VALUES (?1, ?2)",
            params![member.reservation_id.to_string(), member.student_id.to_string()],
        )?;
        Ok(())
    }

    fn remove_reservation_member(&mut self, member: ReservationMember) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM reservation_members WHERE reservation_id = ?1 AND student_id = ?2",
            params![member.reservation_id.to_string(), member.student_id.to_string()],
        )?;
        Ok(())
    }

    // ── Completion ───────────────────────────────────────────────

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.finish("COMMIT")?;
        debug!("Committed transaction");
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        self.finish("ROLLBACK")
    }
}
