//! Part-of hierarchy of classes, built once per sync.

use rostersync_types::{Class, ClassId, OfferingId};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Parent links of every class of the offerings loaded so far.
#[derive(Debug, Default)]
pub struct ClassTree {
    parents: HashMap<ClassId, Option<ClassId>>,
    offerings: HashSet<OfferingId>,
}

impl ClassTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, offering_id: OfferingId) -> bool {
        self.offerings.contains(&offering_id)
    }

    /// Adds all classes of one offering.
    pub fn load<'a>(
        &mut self,
        offering_id: OfferingId,
        classes: impl IntoIterator<Item = &'a Class>,
    ) {
        self.offerings.insert(offering_id);
        for class in classes {
            self.parents.insert(class.id, class.parent_id);
        }
    }

    /// Parent, grandparent, ... of `class_id`, nearest first.
    pub fn ancestors(&self, class_id: ClassId) -> Vec<ClassId> {
        let mut out = Vec::new();
        let mut current = self.parents.get(&class_id).copied().flatten();
        while let Some(id) = current {
            // A malformed hierarchy must not loop forever.
            if id == class_id || out.contains(&id) {
                break;
            }
            out.push(id);
            current = self.parents.get(&id).copied().flatten();
        }
        out
    }

    /// `class_id` followed by its ancestors.
    pub fn with_ancestors(&self, class_id: ClassId) -> Vec<ClassId> {
        let mut out = vec![class_id];
        out.extend(self.ancestors(class_id));
        out
    }

    pub fn is_ancestor(&self, ancestor: ClassId, class_id: ClassId) -> bool {
        self.ancestors(class_id).contains(&ancestor)
    }

    /// Members of `classes` that have no descendant in `classes`.
    pub fn leaves(&self, classes: &BTreeSet<ClassId>) -> BTreeSet<ClassId> {
        let inner: HashSet<ClassId> = classes
            .iter()
            .flat_map(|&id| self.ancestors(id))
            .collect();
        classes
            .iter()
            .copied()
            .filter(|id| !inner.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rostersync_types::ConfigId;

    fn make_class(offering_id: OfferingId, parent: Option<&Class>) -> Class {
        Class {
            id: ClassId::new(),
            offering_id,
            config_id: ConfigId::new(),
            parent_id: parent.map(|p| p.id),
            subpart: "Lec".into(),
            suffix: "1".into(),
        }
    }

    #[test]
    fn ancestors_walk_to_root() {
        let offering = OfferingId::new();
        let lecture = make_class(offering, None);
        let recitation = make_class(offering, Some(&lecture));
        let lab = make_class(offering, Some(&recitation));

        let mut tree = ClassTree::new();
        tree.load(offering, [&lecture, &recitation, &lab]);

        assert!(tree.is_loaded(offering));
        assert_eq!(tree.ancestors(lab.id), vec![recitation.id, lecture.id]);
        assert_eq!(tree.with_ancestors(lecture.id), vec![lecture.id]);
        assert!(tree.is_ancestor(lecture.id, lab.id));
        assert!(!tree.is_ancestor(lab.id, lecture.id));
    }

    #[test]
    fn leaves_drop_classes_with_descendants() {
        let offering = OfferingId::new();
        let lecture = make_class(offering, None);
        let lab_a = make_class(offering, Some(&lecture));
        let lab_b = make_class(offering, Some(&lecture));
        let other = make_class(offering, None);

        let mut tree = ClassTree::new();
        tree.load(offering, [&lecture, &lab_a, &lab_b, &other]);

        let set = BTreeSet::from([lecture.id, lab_a.id, other.id]);
        assert_eq!(tree.leaves(&set), BTreeSet::from([lab_a.id, other.id]));
    }

    #[test]
    fn unknown_classes_are_their_own_leaves() {
        let tree = ClassTree::new();
        let id = ClassId::new();
        assert!(tree.ancestors(id).is_empty());
        assert_eq!(tree.leaves(&BTreeSet::from([id])), BTreeSet::from([id]));
    }

    #[test]
    fn cyclic_parents_terminate() {
        let offering = OfferingId::new();
        let mut a = make_class(offering, None);
        let b = make_class(offering, Some(&a));
        a.parent_id = Some(b.id);

        let mut tree = ClassTree::new();
        tree.load(offering, [&a, &b]);
        assert_eq!(tree.ancestors(a.id), vec![b.id]);
    }
}
