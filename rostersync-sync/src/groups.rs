//! Student group membership.

use crate::error::SyncResult;
use crate::update::StudentUpdate;
use rostersync_types::{
    GroupEntry, GroupId, GroupMembership, GroupType, GroupTypeId, StudentGroup, StudentSnapshot,
};
use std::collections::BTreeMap;

/// Group types created on first use, with their labels.
const RESERVED_GROUP_TYPES: [(&str, &str); 2] =
    [("SPORT", "Student Athletes"), ("COHORT", "Student Cohorts")];

fn type_label(group_type: Option<&GroupType>) -> &str {
    group_type.map_or("Student", |t| t.label.as_str())
}

impl StudentUpdate<'_> {
    pub(crate) fn update_groups(&mut self, snapshot: &StudentSnapshot) -> SyncResult<bool> {
        let current = self.tx.student_groups(self.student.id)?;

        let mut desired: BTreeMap<GroupId, StudentGroup> = BTreeMap::new();
        for entry in &snapshot.groups {
            if entry
                .campus
                .as_deref()
                .is_some_and(|c| c != self.session.academic_initiative)
            {
                continue;
            }
            if self.patterns.ignores_group(&entry.external_id) {
                continue;
            }
            match self.resolve_group(entry, &current) {
                Ok(group) => {
                    desired.insert(group.id, group);
                }
                Err(err) => self
                    .log
                    .warn(format!("Failed to update group {}: {err}", entry.external_id)),
            }
        }

        let mut changed = false;
        for group in current {
            if desired.remove(&group.id).is_some() {
                continue;
            }
            // Locally created groups are not managed by the feed.
            if group.external_id.is_none() {
                continue;
            }
            self.tx.remove_group_member(GroupMembership {
                group_id: group.id,
                student_id: self.student.id,
            })?;
            changed = true;
            let suffix = self.group_type_suffix(&group)?;
            self.log.info(format!(
                "Student {} dropped from {}{suffix}",
                self.student.external_id, group.name
            ));
        }

        for group in desired.into_values() {
            self.tx.add_group_member(GroupMembership {
                group_id: group.id,
                student_id: self.student.id,
            })?;
            changed = true;
            let suffix = self.group_type_suffix(&group)?;
            self.log.info(format!(
                "Student {} added to {}{suffix}",
                self.student.external_id, group.name
            ));
        }
        Ok(changed)
    }

    /// Finds or creates the group of one entry, editing it to match.
    fn resolve_group(
        &mut self,
        entry: &GroupEntry,
        current: &[StudentGroup],
    ) -> SyncResult<StudentGroup> {
        let existing = match current
            .iter()
            .find(|g| g.external_id.as_deref() == Some(entry.external_id.as_str()))
        {
            Some(group) => Some(group.clone()),
            None => self.tx.find_group(self.session.id, &entry.external_id)?,
        };

        let group_type = match entry.group_type.as_deref() {
            Some(reference) => {
                let current_type = match existing.as_ref().and_then(|g| g.type_id) {
                    Some(id) => self.tx.group_type(id)?,
                    None => None,
                };
                self.resolve_group_type(reference, current_type)?
            }
            None => None,
        };
        let label = type_label(group_type.as_ref()).to_string();
        let session = self.session_label();

        let Some(mut group) = existing else {
            let group = StudentGroup {
                id: GroupId::new(),
                session_id: self.session.id,
                external_id: Some(entry.external_id.clone()),
                abbreviation: entry
                    .abbreviation
                    .clone()
                    .unwrap_or_else(|| entry.external_id.clone()),
                name: entry.name.clone().unwrap_or_else(|| entry.external_id.clone()),
                type_id: group_type.as_ref().map(|t| t.id),
            };
            self.tx.save_group(&group)?;
            self.log.info(format!(
                "Added {label} Group: {} - {} - {} to session {session}",
                entry.external_id, group.abbreviation, group.name
            ));
            return Ok(group);
        };

        let mut edited = false;
        if let Some(abbreviation) = &entry.abbreviation
            && *abbreviation != group.abbreviation
        {
            self.log.info(format!(
                "Changed {label} Group: {} - old abbreviation: {}, new abbreviation: {abbreviation} in session {session}",
                entry.external_id, group.abbreviation
            ));
            group.abbreviation.clone_from(abbreviation);
            edited = true;
        }
        if let Some(name) = &entry.name
            && *name != group.name
        {
            self.log.info(format!(
                "Changed {label} Group: {} - old name: {}, new name: {name} in session {session}",
                entry.external_id, group.name
            ));
            group.name.clone_from(name);
            edited = true;
        }
        let type_id = group_type.as_ref().map(|t| t.id);
        if type_id != group.type_id {
            let old = match group.type_id {
                Some(id) => self.tx.group_type(id)?.map(|t| t.reference),
                None => None,
            };
            self.log.info(format!(
                "Changed {label} Group: {} - old type: {}, new type: {} in session {session}",
                entry.external_id,
                old.as_deref().unwrap_or("none"),
                entry.group_type.as_deref().unwrap_or("none")
            ));
            group.type_id = type_id;
            edited = true;
        }
        if edited {
            self.tx.save_group(&group)?;
        }
        Ok(group)
    }

    fn resolve_group_type(
        &mut self,
        reference: &str,
        current: Option<GroupType>,
    ) -> SyncResult<Option<GroupType>> {
        if let Some(group_type) = current.filter(|t| t.reference == reference) {
            return Ok(Some(group_type));
        }
        if let Some(group_type) = self.tx.find_group_type(reference)? {
            return Ok(Some(group_type));
        }
        let Some((_, label)) = RESERVED_GROUP_TYPES.iter().find(|(r, _)| *r == reference) else {
            return Ok(None);
        };
        let group_type = GroupType {
            id: GroupTypeId::new(),
            reference: reference.to_string(),
            label: (*label).to_string(),
        };
        self.tx.save_group_type(&group_type)?;
        self.log.info(format!("Added group type {reference} ({label})"));
        Ok(Some(group_type))
    }

    fn group_type_suffix(&self, group: &StudentGroup) -> SyncResult<String> {
        Ok(match group.type_id {
            Some(id) => self
                .tx
                .group_type(id)?
                .map(|t| format!(" ({})", t.reference))
                .unwrap_or_default(),
            None => String::new(),
        })
    }
}
