//! Identifier types used throughout rostersync.
//!
//! Uses UUID v7 for time-ordered, globally unique identifiers. Each entity
//! family gets its own newtype so a `ClassId` can never be handed where a
//! `CourseId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new identifier with the current timestamp.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses an identifier from a string.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(
    /// Academic session (one term at one campus).
    SessionId
);
define_id!(StudentId);
define_id!(AreaId);
define_id!(ClassificationId);
define_id!(MajorId);
define_id!(
    /// A student's (area, classification, major) assignment row.
    AcmId
);
define_id!(GroupId);
define_id!(GroupTypeId);
define_id!(RoleId);
define_id!(AdvisorId);
define_id!(
    /// Instructional offering: the unit that owns classes and reservations.
    OfferingId
);
define_id!(
    /// Course offering: one (subject, course number) listing of an offering.
    CourseId
);
define_id!(ClassId);
define_id!(
    /// Instructional offering configuration.
    ConfigId
);
define_id!(DemandId);
define_id!(RequestId);
define_id!(EnrollmentId);
define_id!(MessageId);
define_id!(ReservationId);
