//! Splits a parsed document into one face list per material
//!
//! Groups keep referencing the document's attribute arrays, so no vertex
//! data is copied here. Iteration order is the order in which each material
//! is first used, which keeps bake and draw order reproducible.

use std::collections::HashMap;
use std::fmt;

use crate::assets::obj_loader::{Face, ObjDocument};

/// Key of a material group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Faces that used `usemtl <name>`, whether or not the material exists
    Material(String),
    /// Faces declared before any `usemtl`
    Unassigned,
}

impl GroupKey {
    /// Material name, if any
    pub fn material_name(&self) -> Option<&str> {
        match self {
            Self::Material(name) => Some(name),
            Self::Unassigned => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Material(name) => f.write_str(name),
            Self::Unassigned => f.write_str("none"),
        }
    }
}

/// Faces sharing one material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialGroup {
    /// Group key
    pub key: GroupKey,
    /// Faces, in document order
    pub faces: Vec<Face>,
    /// Index of each face in the document
    pub face_indices: Vec<usize>,
}

impl MaterialGroup {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            faces: Vec::new(),
            face_indices: Vec::new(),
        }
    }

    /// Number of faces in this group
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether the group has no faces
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Ordered partition of a document's faces
#[derive(Debug, Clone, Default)]
pub struct MaterialGroups {
    groups: Vec<MaterialGroup>,
    index: HashMap<GroupKey, usize>,
}

impl MaterialGroups {
    /// Groups in first-use order
    pub fn iter(&self) -> std::slice::Iter<'_, MaterialGroup> {
        self.groups.iter()
    }

    /// Look up a group by key
    pub fn get(&self, key: &GroupKey) -> Option<&MaterialGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no groups
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of faces across all groups
    pub fn face_count(&self) -> usize {
        self.groups.iter().map(MaterialGroup::len).sum()
    }

    fn push(&mut self, key: GroupKey, face_index: usize, face: Face) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.groups.push(MaterialGroup::new(key.clone()));
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[slot];
        group.faces.push(face);
        group.face_indices.push(face_index);
    }
}

impl<'a> IntoIterator for &'a MaterialGroups {
    type Item = &'a MaterialGroup;
    type IntoIter = std::slice::Iter<'a, MaterialGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Material grouping
pub struct MaterialGrouper;

impl MaterialGrouper {
    /// Partition `document`'s faces by material name
    pub fn split(document: &ObjDocument) -> MaterialGroups {
        let mut groups = MaterialGroups::default();

        for (face_index, face) in document.faces.iter().enumerate() {
            let key = document
                .face_material(face_index)
                .map_or(GroupKey::Unassigned, |name| GroupKey::Material(name.to_string()));
            groups.push(key, face_index, *face);
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ObjLoader;
    use crate::config::ParseOptions;

    fn document(contents: &str) -> ObjDocument {
        ObjLoader::parse("test.obj", contents, &ParseOptions::default()).unwrap()
    }

    const MIXED: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\n\
f 1 2 3\n\
usemtl Red\nf 2 4 3\n\
usemtl Blue\nf 1 2 4\n\
usemtl Red\nf 1 3 4\n\
usemtl Missing\nf 3 2 1\n";

    #[test]
    fn test_groups_partition_all_faces_once() {
        let doc = document(MIXED);
        let groups = MaterialGrouper::split(&doc);

        assert_eq!(groups.face_count(), doc.faces.len());

        let mut seen: Vec<usize> = groups.iter().flat_map(|g| g.face_indices.iter().copied()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..doc.faces.len()).collect::<Vec<_>>());

        for group in &groups {
            for (face, &index) in group.faces.iter().zip(&group.face_indices) {
                assert_eq!(*face, doc.faces[index]);
            }
        }
    }

    #[test]
    fn test_group_order_is_first_use_order() {
        let groups = MaterialGrouper::split(&document(MIXED));
        let keys: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(keys, ["none", "Red", "Blue", "Missing"]);

        let red = groups.get(&GroupKey::Material("Red".to_string())).unwrap();
        assert_eq!(red.face_indices, [1, 3]);
    }

    #[test]
    fn test_unmatched_material_keeps_its_own_group() {
        let groups = MaterialGrouper::split(&document(MIXED));
        let missing = groups.get(&GroupKey::Material("Missing".to_string())).unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing.key.material_name(), Some("Missing"));
    }

    #[test]
    fn test_material_named_none_is_not_the_unassigned_group() {
        let doc = document("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\nusemtl none\nf 1 2 3\n");
        let groups = MaterialGrouper::split(&doc);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(&GroupKey::Unassigned).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_document_has_no_groups() {
        let groups = MaterialGrouper::split(&ObjDocument::default());
        assert!(groups.is_empty());
    }
}
