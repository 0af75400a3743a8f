//! Student identity fields and academic program assignments.

use crate::error::SyncResult;
use crate::update::StudentUpdate;
use rostersync_types::{
    AcademicArea, AcademicClassification, AcmId, AreaClassificationMajor, AreaId,
    ClassificationId, Major, MajorId, ProgramEntry, StudentSnapshot,
};
use std::collections::BTreeSet;

/// An existing assignment with its references resolved, when they still exist.
struct Assignment {
    id: AcmId,
    area: Option<AcademicArea>,
    classification: Option<AcademicClassification>,
    major: Option<Major>,
}

impl Assignment {
    fn matches(&self, entry: &ProgramEntry) -> bool {
        self.area.as_ref().is_some_and(|a| a.matches(&entry.area))
            && self
                .classification
                .as_ref()
                .is_some_and(|c| c.matches(&entry.classification))
            && self.major.as_ref().is_some_and(|m| m.matches(&entry.major))
    }
}

/// Existing references of a program entry. Missing ones are created only
/// after every lookup succeeded.
struct ProgramRefs {
    area: Option<AreaId>,
    classification: Option<ClassificationId>,
    major: Option<MajorId>,
}

fn assign(field: &mut Option<String>, value: &Option<String>) -> bool {
    if field == value {
        return false;
    }
    field.clone_from(value);
    true
}

impl StudentUpdate<'_> {
    /// Names and email, then program assignments when the snapshot asks for it.
    pub(crate) fn update_demographics(&mut self, snapshot: &StudentSnapshot) -> SyncResult<bool> {
        let mut changed = false;
        let student = &mut self.student;
        changed |= assign(&mut student.first_name, &snapshot.first_name);
        changed |= assign(&mut student.middle_name, &snapshot.middle_name);
        changed |= assign(&mut student.last_name, &snapshot.last_name);
        changed |= assign(&mut student.email, &snapshot.email);

        if snapshot.update_programs {
            changed |= self.update_programs(&snapshot.programs)?;
        }
        Ok(changed)
    }

    /// An entry whose lookups fail is skipped with a warning before anything
    /// is written for it. Store errors while writing abort the sync.
    fn update_programs(&mut self, programs: &[ProgramEntry]) -> SyncResult<bool> {
        let mut changed = false;
        let mut remaining = Vec::new();
        for acm in self.tx.student_programs(self.student.id)? {
            remaining.push(Assignment {
                id: acm.id,
                area: self.tx.area(acm.area_id)?,
                classification: self.tx.classification(acm.classification_id)?,
                major: self.tx.major(acm.major_id)?,
            });
        }

        let campus = self.session.campus().to_string();
        for entry in programs {
            if entry.campus.as_deref().is_some_and(|c| c != campus) {
                continue;
            }
            if let Some(pos) = remaining.iter().position(|a| a.matches(entry)) {
                remaining.remove(pos);
                continue;
            }
            let refs = match self.find_program_refs(entry) {
                Ok(refs) => refs,
                Err(err) => {
                    self.log.warn(format!(
                        "Failed to add program {}/{} {}: {err}",
                        entry.area, entry.major, entry.classification
                    ));
                    continue;
                }
            };
            self.add_program(entry, refs)?;
            changed = true;
        }

        for assignment in remaining {
            self.tx.delete_program(assignment.id)?;
            changed = true;
        }
        Ok(changed)
    }

    fn find_program_refs(&self, entry: &ProgramEntry) -> SyncResult<ProgramRefs> {
        let session_id = self.session.id;
        let area = self.tx.find_area(session_id, &entry.area)?.map(|a| a.id);
        let classification = self
            .tx
            .find_classification(session_id, &entry.classification)?
            .map(|c| c.id);
        // A new area has no majors yet.
        let major = match area {
            Some(area_id) => self
                .tx
                .find_major(session_id, area_id, &entry.major)?
                .map(|m| m.id),
            None => None,
        };
        Ok(ProgramRefs {
            area,
            classification,
            major,
        })
    }

    fn add_program(&mut self, entry: &ProgramEntry, refs: ProgramRefs) -> SyncResult<()> {
        let area_id = match refs.area {
            Some(id) => id,
            None => self.create_area(&entry.area)?,
        };
        let classification_id = match refs.classification {
            Some(id) => id,
            None => self.create_classification(&entry.classification)?,
        };
        let major_id = match refs.major {
            Some(id) => id,
            None => self.create_major(&entry.major, area_id, &entry.area)?,
        };
        self.tx.save_program(&AreaClassificationMajor {
            id: AcmId::new(),
            student_id: self.student.id,
            area_id,
            classification_id,
            major_id,
        })?;
        Ok(())
    }

    fn create_area(&mut self, key: &str) -> SyncResult<AreaId> {
        let area = AcademicArea {
            id: AreaId::new(),
            session_id: self.session.id,
            external_id: Some(key.to_string()),
            abbreviation: key.to_string(),
            title: key.to_string(),
        };
        self.tx.save_area(&area)?;
        self.log.info(format!("Added Academic Area: {key}"));
        Ok(area.id)
    }

    fn create_classification(&mut self, key: &str) -> SyncResult<ClassificationId> {
        let classification = AcademicClassification {
            id: ClassificationId::new(),
            session_id: self.session.id,
            external_id: Some(key.to_string()),
            code: key.to_string(),
            name: key.to_string(),
        };
        self.tx.save_classification(&classification)?;
        self.log.info(format!("Added Academic Classification: {key}"));
        Ok(classification.id)
    }

    fn create_major(&mut self, key: &str, area_id: AreaId, area_key: &str) -> SyncResult<MajorId> {
        let major = Major {
            id: MajorId::new(),
            session_id: self.session.id,
            external_id: Some(key.to_string()),
            code: key.to_string(),
            name: key.to_string(),
            area_ids: BTreeSet::from([area_id]),
        };
        self.tx.save_major(&major)?;
        self.log.info(format!("Added Major: {key} to Academic Area: {area_key}"));
        Ok(major.id)
    }
}
