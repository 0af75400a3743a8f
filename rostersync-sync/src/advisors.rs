//! Advisor links.

use crate::collaborators::DirectoryLookup;
use crate::error::SyncResult;
use crate::update::StudentUpdate;
use rostersync_types::{Advisor, AdvisorEntry, AdvisorId, AdvisorLink, Role, StudentSnapshot};
use std::collections::BTreeMap;

/// Role every advisor falls back to.
const DEFAULT_ADVISOR_ROLE: &str = "Advisor";

impl StudentUpdate<'_> {
    pub(crate) async fn update_advisors(
        &mut self,
        snapshot: &StudentSnapshot,
        directory: &dyn DirectoryLookup,
    ) -> SyncResult<bool> {
        let mut desired: BTreeMap<AdvisorId, Advisor> = BTreeMap::new();
        for entry in &snapshot.advisors {
            let Some(role) = self.resolve_role(entry)? else {
                self.log.warn(format!(
                    "No advisor role found for {}",
                    entry.role.as_deref().unwrap_or("")
                ));
                continue;
            };
            match self.resolve_advisor(entry, &role, directory).await {
                Ok(advisor) => {
                    desired.insert(advisor.id, advisor);
                }
                Err(err) => self
                    .log
                    .warn(format!("Failed to update advisor {}: {err}", entry.external_id)),
            }
        }

        let mut changed = false;
        for advisor in self.tx.student_advisors(self.student.id)? {
            if desired.remove(&advisor.id).is_some() {
                continue;
            }
            self.tx.remove_advisor_link(AdvisorLink {
                advisor_id: advisor.id,
                student_id: self.student.id,
            })?;
            changed = true;
            self.log.info(format!(
                "Student {} dropped from advisor {}",
                self.student.external_id, advisor.external_id
            ));
        }

        for advisor in desired.into_values() {
            self.tx.add_advisor_link(AdvisorLink {
                advisor_id: advisor.id,
                student_id: self.student.id,
            })?;
            changed = true;
            self.log.info(format!(
                "Student {} added to advisor {}",
                self.student.external_id, advisor.external_id
            ));
        }
        Ok(changed)
    }

    /// `"<type> Advisor"`, falling back to the plain advisor role.
    fn resolve_role(&self, entry: &AdvisorEntry) -> SyncResult<Option<Role>> {
        if let Some(kind) = entry.role.as_deref().filter(|r| !r.is_empty())
            && let Some(role) = self.tx.find_role(&format!("{kind} {DEFAULT_ADVISOR_ROLE}"))?
        {
            return Ok(Some(role));
        }
        Ok(self.tx.find_role(DEFAULT_ADVISOR_ROLE)?)
    }

    async fn resolve_advisor(
        &mut self,
        entry: &AdvisorEntry,
        role: &Role,
        directory: &dyn DirectoryLookup,
    ) -> SyncResult<Advisor> {
        if let Some(advisor) = self
            .tx
            .find_advisor(self.session.id, &entry.external_id, role.id)?
        {
            return Ok(advisor);
        }

        let mut advisor = Advisor::new(self.session.id, &entry.external_id, role.id);
        self.tx.save_advisor(&advisor)?;
        match directory.enrich(&mut advisor).await {
            Ok(true) => self.tx.save_advisor(&advisor)?,
            Ok(false) => {}
            Err(err) => self.log.info(format!("Failed to lookup advisor details: {err}")),
        }
        let session = self.session_label();
        self.log.info(format!(
            "Added Advisor: {} - {} to session {session}",
            advisor.external_id, role.reference
        ));
        Ok(advisor)
    }
}
