use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An audit comment anchored to a run range in the tree.
///
/// The anchor itself lives in the tree as start/end/reference marker nodes carrying `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub author: String,
    pub initials: String,
    pub timestamp: DateTime<Utc>,
    pub body: String,
}

/// The single per-document annotation collection, shared by body, headers and footers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn push(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(|a| a.id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
