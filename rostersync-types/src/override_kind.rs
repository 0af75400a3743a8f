//! Override kind normalization.
//!
//! The feed sends free-form override type strings per restricted course or
//! registration number. Per offering these collapse into exactly one
//! [`OverrideKind`]; see [`OverrideKind::classify`].

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Non-capacity restrictions an override can lift.
///
/// Declaration order is the tie-break order used by [`OverrideKind::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Restriction {
    ClassLink,
    CoRequisite,
    Prerequisite,
    Program,
    Level,
    /// Anything else the registration system can waive.
    Generic,
}

/// Normalized override kind stored on an override reservation.
///
/// Ordering follows declaration order, so `TimeConflict` is the lowest
/// ordinal and `Other(Restriction::Generic)` the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OverrideKind {
    TimeConflict,
    OverLimit,
    /// Both a time-conflict and an over-limit override.
    Combined,
    Other(Restriction),
}

impl OverrideKind {
    /// Every recognized kind, in ordinal order.
    pub const ALL: [Self; 9] = [
        Self::TimeConflict,
        Self::OverLimit,
        Self::Combined,
        Self::Other(Restriction::ClassLink),
        Self::Other(Restriction::CoRequisite),
        Self::Other(Restriction::Prerequisite),
        Self::Other(Restriction::Program),
        Self::Other(Restriction::Level),
        Self::Other(Restriction::Generic),
    ];

    /// The generic catch-all kind.
    pub const OTHER: Self = Self::Other(Restriction::Generic);

    /// Reference string as sent by the feed.
    pub const fn reference(&self) -> &'static str {
        match self {
            Self::TimeConflict => "AllowTimeConflict",
            Self::OverLimit => "AllowOverLimit",
            Self::Combined => "AllowOverLimitTimeConflict",
            Self::Other(Restriction::ClassLink) => "ClassLink",
            Self::Other(Restriction::CoRequisite) => "CoRequisite",
            Self::Other(Restriction::Prerequisite) => "Prerequisite",
            Self::Other(Restriction::Program) => "Program",
            Self::Other(Restriction::Level) => "Level",
            Self::Other(Restriction::Generic) => "Other",
        }
    }

    /// Looks up a kind by its reference string, ignoring case.
    pub fn from_reference(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.reference().eq_ignore_ascii_case(raw))
    }

    /// Lifts the class capacity limit.
    pub const fn allows_over_limit(&self) -> bool {
        matches!(self, Self::OverLimit | Self::Combined)
    }

    /// Lifts the time-conflict check.
    pub const fn allows_time_conflict(&self) -> bool {
        matches!(self, Self::TimeConflict | Self::Combined)
    }

    /// Collapses the raw override type strings recorded for one offering,
    /// each paired with the size of its restricted class set, into a single
    /// kind.
    ///
    /// - time-conflict and over-limit together give [`OverrideKind::Combined`]
    /// - either alone gives that kind
    /// - otherwise the recognized kind with the most restricted classes wins,
    ///   ties going to the lower ordinal
    /// - with nothing recognized the result is [`OverrideKind::OTHER`]
    pub fn classify<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let mut time = false;
        let mut space = false;
        let mut other: Option<(Self, usize)> = None;

        for (raw, restricted) in entries {
            let Some(kind) = Self::from_reference(raw) else {
                continue;
            };
            match kind {
                Self::TimeConflict => time = true,
                Self::OverLimit => space = true,
                _ => {
                    let better = match other {
                        None => true,
                        Some((best, best_size)) => {
                            restricted > best_size || (restricted == best_size && kind < best)
                        }
                    };
                    if better {
                        other = Some((kind, restricted));
                    }
                }
            }
        }

        match (time, space) {
            (true, true) => Self::Combined,
            (true, false) => Self::TimeConflict,
            (false, true) => Self::OverLimit,
            (false, false) => other.map_or(Self::OTHER, |(kind, _)| kind),
        }
    }
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reference())
    }
}

impl FromStr for OverrideKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reference(s).ok_or_else(|| Error::UnknownOverrideType(s.to_string()))
    }
}
