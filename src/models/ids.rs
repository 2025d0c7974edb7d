//! Opaque identifiers for topics and memo revisions.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a topic, the grouping key of its revisions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identifier for a topic that has no revisions yet (random v4 UUID).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of one immutable memo revision.
///
/// The empty id marks the placeholder memo of a topic that was never saved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoId(String);

impl MemoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MemoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Which revision of a topic is selected: the current latest, or a pinned one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RevisionRef {
    #[default]
    Latest,
    Id(MemoId),
}

impl RevisionRef {
    pub fn id(&self) -> Option<&MemoId> {
        match self {
            RevisionRef::Latest => None,
            RevisionRef::Id(id) => Some(id),
        }
    }
}

impl From<Option<MemoId>> for RevisionRef {
    fn from(id: Option<MemoId>) -> Self {
        id.map_or(RevisionRef::Latest, RevisionRef::Id)
    }
}
