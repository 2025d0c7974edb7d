//! The persistence boundary: one call per store operation.
//!
//! The backend is the sole owner of durable topic, memo and tag state. It must
//! keep at most one `latest` revision per topic, serializing concurrent creates
//! for the same topic.

mod http;
mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Memo, MemoId, Topic, TopicId};

/// Durable store of topics, memo revisions and tags.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Topics matching `keyword`, newest first. An empty keyword lists all.
    async fn list_topics(&self, keyword: &str) -> Result<Vec<Topic>, AppError>;

    /// A revision, or the latest one when `id` is `None`.
    ///
    /// A topic without revisions yields [`Memo::empty`].
    async fn get_memo(&self, topic_id: &TopicId, id: Option<&MemoId>) -> Result<Memo, AppError>;

    /// All revisions of a topic, newest first.
    async fn list_memos(&self, topic_id: &TopicId) -> Result<Vec<Memo>, AppError>;

    /// Append a revision timestamped now; it becomes the only latest one.
    async fn create_memo(&self, topic_id: &TopicId, content: &str) -> Result<Memo, AppError>;

    /// Remove a revision and return how many remain in the topic.
    async fn delete_memo(&self, topic_id: &TopicId, id: &MemoId) -> Result<usize, AppError>;

    /// Tags of a topic, sorted.
    async fn list_tags(&self, topic_id: &TopicId) -> Result<Vec<String>, AppError>;

    /// Fails with [`AppError::Conflict`] when the tag is already present.
    async fn add_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError>;

    /// Fails with [`AppError::NotFound`] when the tag is absent.
    async fn remove_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError>;
}

/// Current time in whole seconds since the Unix epoch.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
