//! Row types for the catalog tables.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetInfo {
    pub id: i64,
    pub image_root: String,
    pub image_exts: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub super_name: String,
}

/// A tag as it appears in the vocabulary file, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTag {
    pub name: String,
    pub super_name: String,
}

/// One row of the image/tag join table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageToTag {
    pub id: i64,
    pub image_id: i64,
    pub tag_id: i64,
}

/// Either a bare id that still has to be looked up, or an already loaded row.
#[derive(Debug, Clone)]
pub enum EntityRef<T> {
    Id(i64),
    Resolved(T),
}

impl<T> From<i64> for EntityRef<T> {
    fn from(id: i64) -> Self {
        EntityRef::Id(id)
    }
}

impl From<Image> for EntityRef<Image> {
    fn from(image: Image) -> Self {
        EntityRef::Resolved(image)
    }
}

impl From<Tag> for EntityRef<Tag> {
    fn from(tag: Tag) -> Self {
        EntityRef::Resolved(tag)
    }
}

/// Tag names grouped by super-category.
///
/// Groups keep the order in which their super_name was first seen, and names
/// within a group keep iteration order. That order comes from table order and
/// is not something callers should rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagGroups {
    groups: Vec<(String, Vec<String>)>,
}

impl TagGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, super_name: &str, name: &str) {
        match self.groups.iter_mut().find(|(key, _)| key == super_name) {
            Some((_, names)) => names.push(name.to_string()),
            None => self
                .groups
                .push((super_name.to_string(), vec![name.to_string()])),
        }
    }

    pub fn get(&self, super_name: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(key, _)| key == super_name)
            .map(|(_, names)| names.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(key, names)| (key.as_str(), names.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Flatten back into `(name, super_name)` pairs.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.groups
            .iter()
            .flat_map(|(key, names)| names.iter().map(move |n| (n.clone(), key.clone())))
            .collect()
    }
}

impl<'a> FromIterator<&'a Tag> for TagGroups {
    fn from_iter<I: IntoIterator<Item = &'a Tag>>(iter: I) -> Self {
        let mut groups = TagGroups::new();
        for tag in iter {
            groups.push(&tag.super_name, &tag.name);
        }
        groups
    }
}

impl Serialize for TagGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (key, names) in &self.groups {
            map.serialize_entry(key, names)?;
        }
        map.end()
    }
}
