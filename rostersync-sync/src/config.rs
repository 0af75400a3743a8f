//! Sync configuration.

use crate::error::{SyncError, SyncResult};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Environment variable holding the override type allow-list pattern.
pub const OVERRIDE_TYPES_ENV: &str = "ROSTERSYNC_OVERRIDE_TYPES";
/// Environment variable holding the ignored group pattern.
pub const IGNORE_GROUPS_ENV: &str = "ROSTERSYNC_IGNORE_GROUPS";

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Override type strings must fully match this pattern to be considered.
    pub override_types: Option<String>,
    /// Groups whose external id fully matches this pattern are skipped.
    pub ignore_groups: Option<String>,
    /// Emit student-changed notifications after a changed commit.
    pub notify: bool,
    /// Give up waiting for a student lock after this many milliseconds.
    pub lock_timeout_ms: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            override_types: None,
            ignore_groups: None,
            notify: true,
            lock_timeout_ms: None,
        }
    }
}

impl SyncConfig {
    /// Reads the patterns from the environment, leaving the rest at defaults.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            override_types: non_empty(OVERRIDE_TYPES_ENV),
            ignore_groups: non_empty(IGNORE_GROUPS_ENV),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// Compiles the configured patterns.
    pub fn patterns(&self) -> SyncResult<Patterns> {
        Ok(Patterns {
            override_types: compile(self.override_types.as_deref())?,
            ignore_groups: compile(self.ignore_groups.as_deref())?,
        })
    }
}

fn compile(pattern: Option<&str>) -> SyncResult<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(&format!("^(?:{p})$"))
                .map_err(|e| SyncError::Config(format!("invalid pattern {p:?}: {e}")))
        })
        .transpose()
}

/// Compiled full-match patterns of a [`SyncConfig`].
#[derive(Debug, Clone, Default)]
pub struct Patterns {
    override_types: Option<Regex>,
    ignore_groups: Option<Regex>,
}

impl Patterns {
    /// An override type passes when no allow-list is configured or it matches.
    pub fn allows_override_type(&self, override_type: &str) -> bool {
        self.override_types
            .as_ref()
            .is_none_or(|re| re.is_match(override_type))
    }

    pub fn ignores_group(&self, external_id: &str) -> bool {
        self.ignore_groups
            .as_ref()
            .is_some_and(|re| re.is_match(external_id))
    }
}
