//! Memo revision model.

use serde::{Deserialize, Serialize};

use super::{MemoId, TopicId};

/// One immutable revision of a topic's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub id: MemoId,
    pub topic_id: TopicId,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    pub latest: bool,
    pub content: String,
}

impl Memo {
    /// The memo returned for a topic without revisions: a new, unsaved topic.
    pub fn empty(topic_id: TopicId) -> Self {
        Self {
            id: MemoId::default(),
            topic_id,
            timestamp: 0,
            latest: true,
            content: String::new(),
        }
    }

    /// False for the placeholder produced by [`Memo::empty`].
    pub fn is_saved(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Request body for creating a new revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMemoRequest {
    pub content: String,
}

/// Response body for a deleted revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMemoResponse {
    pub remaining: usize,
}
