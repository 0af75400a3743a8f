//! Injected capabilities: advisor directory lookup and change notification.

use async_trait::async_trait;
use regex_lite::{Regex, escape};
use rostersync_live::StudentView;
use rostersync_types::{Advisor, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

/// A directory lookup failed. Never aborts a sync.
#[derive(Debug, Error)]
#[error("directory lookup failed: {0}")]
pub struct DirectoryError(pub String);

/// Best-effort source of advisor contact details.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// Fills name, title and email of a newly created advisor.
    /// Returns whether the directory knew the advisor.
    async fn enrich(&self, advisor: &mut Advisor) -> Result<bool, DirectoryError>;
}

/// Directory that knows nobody.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

#[async_trait]
impl DirectoryLookup for NoDirectory {
    async fn enrich(&self, _advisor: &mut Advisor) -> Result<bool, DirectoryError> {
        Ok(false)
    }
}

/// One person record as a directory returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub uid: String,
    #[serde(default)]
    pub given_name: Option<String>,
    /// Full name, e.g. `"JOHN Q PUBLIC"`.
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub academic_title: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl DirectoryEntry {
    /// Copies the entry onto an advisor.
    ///
    /// Names are initial-cased. The middle name is what remains of the common
    /// name once the given name and surname are stripped from it.
    pub fn apply_to(&self, advisor: &mut Advisor) {
        let first = self.given_name.as_deref().map(initial_case);
        let last = self.surname.as_deref().map(initial_case);
        let mut middle = self.common_name.as_deref().map(initial_case);

        if let (Some(m), Some(f)) = (middle.as_mut(), first.as_deref()) {
            strip(m, &format!("{} ?", escape(f)));
        }
        if let (Some(m), Some(l)) = (middle.as_mut(), last.as_deref()) {
            strip(m, &format!(" ?{}", escape(l)));
        }

        advisor.first_name = first;
        advisor.middle_name = middle.filter(|m| !m.trim().is_empty());
        advisor.last_name = last;
        advisor.academic_title = self.academic_title.clone();
        advisor.email = self.email.clone();
    }
}

fn strip(value: &mut String, pattern: &str) {
    if let Ok(re) = Regex::new(pattern) {
        *value = re.replace_all(value.as_str(), "").into_owned();
    }
}

/// `"JOHN o'NEIL-SMITH"` becomes `"John O'neil-Smith"`.
fn initial_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut start = true;
    for c in value.chars() {
        if start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        start = c.is_whitespace() || c == '-';
    }
    out
}

/// Directory backed by a fixed set of entries keyed by uid.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: HashMap<String, DirectoryEntry>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: DirectoryEntry) {
        self.entries.insert(entry.uid.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<DirectoryEntry> for StaticDirectory {
    fn from_iter<I: IntoIterator<Item = DirectoryEntry>>(iter: I) -> Self {
        let mut directory = Self::new();
        for entry in iter {
            directory.insert(entry);
        }
        directory
    }
}

#[async_trait]
impl DirectoryLookup for StaticDirectory {
    async fn enrich(&self, advisor: &mut Advisor) -> Result<bool, DirectoryError> {
        match self.entries.get(&advisor.external_id) {
            Some(entry) => {
                entry.apply_to(advisor);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// A committed change of one student, with the live view before and after.
#[derive(Debug, Clone)]
pub struct StudentChange {
    pub student_id: StudentId,
    pub external_id: String,
    /// `None` when the student had no live view yet.
    pub before: Option<StudentView>,
    pub after: Option<StudentView>,
}

/// Receives student-changed notifications. Called after commit only.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn student_changed(&self, change: StudentChange);
}

/// Discards notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNotifications;

#[async_trait]
impl NotificationSink for NoNotifications {
    async fn student_changed(&self, _change: StudentChange) {}
}

/// Logs a line per notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn student_changed(&self, change: StudentChange) {
        let count = |view: &Option<StudentView>| view.as_ref().map_or(0, |v| v.enrolled_classes());
        info!(
            student = %change.external_id,
            "Student changed: {} -> {} enrolled classes",
            count(&change.before),
            count(&change.after)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rostersync_types::{RoleId, SessionId};

    fn make_advisor(uid: &str) -> Advisor {
        Advisor::new(SessionId::new(), uid, RoleId::new())
    }

    #[test]
    fn initial_case_words() {
        assert_eq!(initial_case("JOHN o'NEIL-SMITH"), "John O'neil-Smith");
        assert_eq!(initial_case(""), "");
    }

    #[test]
    fn middle_name_is_stripped_of_first_and_last() {
        let entry = DirectoryEntry {
            uid: "jqp".into(),
            given_name: Some("JOHN".into()),
            common_name: Some("JOHN QUINCY PUBLIC".into()),
            surname: Some("PUBLIC".into()),
            academic_title: Some("Professor".into()),
            email: Some("jqp@example.edu".into()),
        };
        let mut advisor = make_advisor("jqp");
        entry.apply_to(&mut advisor);

        assert_eq!(advisor.first_name.as_deref(), Some("John"));
        assert_eq!(advisor.middle_name.as_deref(), Some("Quincy"));
        assert_eq!(advisor.last_name.as_deref(), Some("Public"));
        assert_eq!(advisor.email.as_deref(), Some("jqp@example.edu"));
    }

    #[test]
    fn common_name_without_middle_leaves_none() {
        let entry = DirectoryEntry {
            uid: "ab".into(),
            given_name: Some("Ann".into()),
            common_name: Some("Ann Bell".into()),
            surname: Some("Bell".into()),
            academic_title: None,
            email: None,
        };
        let mut advisor = make_advisor("ab");
        entry.apply_to(&mut advisor);
        assert_eq!(advisor.middle_name, None);
    }

    #[tokio::test]
    async fn static_directory_enriches_known_uid_only() {
        let directory: StaticDirectory = [DirectoryEntry {
            uid: "known".into(),
            given_name: Some("Kim".into()),
            common_name: None,
            surname: Some("Lee".into()),
            academic_title: None,
            email: None,
        }]
        .into_iter()
        .collect();

        let mut known = make_advisor("known");
        assert!(directory.enrich(&mut known).await.unwrap());
        assert_eq!(known.last_name.as_deref(), Some("Lee"));

        let mut unknown = make_advisor("unknown");
        assert!(!directory.enrich(&mut unknown).await.unwrap());
        assert_eq!(unknown.last_name, None);
    }
}
