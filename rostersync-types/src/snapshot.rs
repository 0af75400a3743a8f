//! Feed snapshot of one student's desired state for a term.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One (area, classification, major) program entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEntry {
    pub area: String,
    pub classification: String,
    pub major: String,
    /// Only applies to sessions at this campus; `None` applies everywhere.
    #[serde(default)]
    pub campus: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub external_id: String,
    #[serde(default)]
    pub campus: Option<String>,
    #[serde(default)]
    pub abbreviation: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Group type reference such as `SPORT` or `COHORT`.
    #[serde(default)]
    pub group_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorEntry {
    pub external_id: String,
    /// Role label; resolved as `"<label> Advisor"`, falling back to `"Advisor"`.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub override_type: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    /// Kept as text: the feed does not guarantee it is numeric.
    #[serde(default)]
    pub registration_number: Option<String>,
}

/// A student's desired state as described by the external feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSnapshot {
    pub external_id: String,
    pub term_code: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub programs: Vec<ProgramEntry>,
    /// Reconcile program assignments. Set automatically by
    /// [`StudentSnapshot::with_program`].
    #[serde(default)]
    pub update_programs: bool,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    #[serde(default)]
    pub advisors: Vec<AdvisorEntry>,
    #[serde(default)]
    pub registration_numbers: BTreeSet<u32>,
    #[serde(default)]
    pub overrides: Vec<OverrideEntry>,
}

impl StudentSnapshot {
    pub fn new(external_id: impl Into<String>, term_code: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            term_code: term_code.into(),
            first_name: None,
            middle_name: None,
            last_name: None,
            email: None,
            programs: Vec::new(),
            update_programs: false,
            groups: Vec::new(),
            advisors: Vec::new(),
            registration_numbers: BTreeSet::new(),
            overrides: Vec::new(),
        }
    }

    pub fn with_name(
        mut self,
        first: Option<&str>,
        middle: Option<&str>,
        last: Option<&str>,
    ) -> Self {
        self.first_name = first.map(str::to_string);
        self.middle_name = middle.map(str::to_string);
        self.last_name = last.map(str::to_string);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Adds a program entry. Entries missing any of area, classification or
    /// major are ignored.
    pub fn with_program(
        mut self,
        area: &str,
        classification: &str,
        major: &str,
        campus: Option<&str>,
    ) -> Self {
        if area.is_empty() || classification.is_empty() || major.is_empty() {
            return self;
        }
        self.update_programs = true;
        self.programs.push(ProgramEntry {
            area: area.to_string(),
            classification: classification.to_string(),
            major: major.to_string(),
            campus: campus.map(str::to_string),
        });
        self
    }

    pub fn update_programs(mut self, update: bool) -> Self {
        self.update_programs = update;
        self
    }

    pub fn with_group(
        mut self,
        external_id: &str,
        campus: Option<&str>,
        abbreviation: Option<&str>,
        name: Option<&str>,
        group_type: Option<&str>,
    ) -> Self {
        self.groups.push(GroupEntry {
            external_id: external_id.to_string(),
            campus: campus.map(str::to_string),
            abbreviation: abbreviation.map(str::to_string),
            name: name.map(str::to_string),
            group_type: group_type.map(str::to_string),
        });
        self
    }

    pub fn with_advisor(mut self, external_id: &str, role: Option<&str>) -> Self {
        self.advisors.push(AdvisorEntry {
            external_id: external_id.to_string(),
            role: role.map(str::to_string),
        });
        self
    }

    pub fn with_registration_number(mut self, crn: u32) -> Self {
        self.registration_numbers.insert(crn);
        self
    }

    pub fn with_override(
        mut self,
        override_type: &str,
        subject: Option<&str>,
        course: Option<&str>,
        registration_number: Option<&str>,
    ) -> Self {
        self.overrides.push(OverrideEntry {
            override_type: override_type.to_string(),
            subject: subject.map(str::to_string),
            course: course.map(str::to_string),
            registration_number: registration_number.map(str::to_string),
        });
        self
    }
}
