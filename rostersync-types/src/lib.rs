//! Core type definitions for rostersync.
//!
//! This crate defines the plain data shared by every other crate:
//! - Row identifiers (UUID v7)
//! - The persisted student-record model (students, programs, groups,
//!   advisors, course demands, enrollments, override reservations)
//! - The feed snapshot describing one student's desired state
//! - Override kind normalization
//!
//! Nothing in here talks to storage or locks; see `rostersync-store` and
//! `rostersync-live` for that.

mod ids;
mod model;
mod override_kind;
mod snapshot;

pub use ids::{
    AcmId, AdvisorId, AreaId, ClassId, ClassificationId, ConfigId, CourseId, DemandId,
    EnrollmentId, GroupId, GroupTypeId, MajorId, MessageId, OfferingId, RequestId,
    ReservationId, RoleId, SessionId, StudentId,
};
pub use model::{
    AcademicArea, AcademicClassification, Advisor, AdvisorLink, AreaClassificationMajor, Class,
    ClassEnrollment, CourseDemand, CourseOffering, CourseRequest, EnrollmentMessage,
    GroupMembership, GroupType, InstructionalOffering, Major, OverrideIntent,
    OverrideReservation, RegistrationSection, ReservationMember, Role, Session, Student,
    StudentGroup,
};
pub use override_kind::{OverrideKind, Restriction};
pub use snapshot::{AdvisorEntry, GroupEntry, OverrideEntry, ProgramEntry, StudentSnapshot};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("unknown override type: {0}")]
    UnknownOverrideType(String),
}
