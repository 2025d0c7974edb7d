//! In-process backend used for tests and the `MEMO_IN_MEMORY` server mode.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{now_timestamp, Backend};
use crate::errors::AppError;
use crate::lifecycle;
use crate::models::{Memo, MemoId, Topic, TopicId};
use crate::search::Keyword;

#[derive(Default)]
struct State {
    /// Revisions per topic in insertion order.
    memos: HashMap<TopicId, Vec<Memo>>,
    tags: HashMap<TopicId, BTreeSet<String>>,
}

/// Backend keeping everything in memory behind one async mutex.
///
/// Holding the lock for the whole of every operation serializes writers, which
/// is what keeps the per-topic latest flag consistent.
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a revision with an explicit timestamp, bypassing the clock.
    pub async fn insert_at(&self, topic_id: &TopicId, timestamp: i64, content: &str) -> Memo {
        let mut state = self.state.lock().await;
        let revisions = state.memos.entry(topic_id.clone()).or_default();
        let id = MemoId::generate();
        revisions.push(Memo {
            id: id.clone(),
            topic_id: topic_id.clone(),
            timestamp,
            latest: false,
            content: content.to_string(),
        });
        lifecycle::promote_latest(revisions);
        revisions
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .unwrap_or_else(|| Memo::empty(topic_id.clone()))
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_topics(&self, keyword: &str) -> Result<Vec<Topic>, AppError> {
        let keyword = Keyword::parse(keyword);
        let state = self.state.lock().await;

        let mut topics: Vec<Topic> = state
            .memos
            .iter()
            .filter(|(topic_id, revisions)| {
                let tags: Vec<String> = state
                    .tags
                    .get(*topic_id)
                    .map(|t| t.iter().cloned().collect())
                    .unwrap_or_default();
                keyword.is_empty() || keyword.matches(revisions, &tags)
            })
            .filter_map(|(_, revisions)| lifecycle::latest_of(revisions).map(Topic::from_latest))
            .collect();

        topics.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(topics)
    }

    async fn get_memo(&self, topic_id: &TopicId, id: Option<&MemoId>) -> Result<Memo, AppError> {
        let state = self.state.lock().await;
        let Some(revisions) = state.memos.get(topic_id).filter(|r| !r.is_empty()) else {
            return Ok(Memo::empty(topic_id.clone()));
        };

        let found = match id {
            Some(id) => revisions.iter().find(|m| &m.id == id),
            None => lifecycle::latest_of(revisions),
        };
        found.cloned().ok_or_else(|| {
            AppError::NotFound(format!(
                "Memo {} not found",
                id.map(MemoId::as_str).unwrap_or_default()
            ))
        })
    }

    async fn list_memos(&self, topic_id: &TopicId) -> Result<Vec<Memo>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .memos
            .get(topic_id)
            .map(|revisions| lifecycle::newest_first(revisions))
            .unwrap_or_default())
    }

    async fn create_memo(&self, topic_id: &TopicId, content: &str) -> Result<Memo, AppError> {
        let mut state = self.state.lock().await;
        let revisions = state.memos.entry(topic_id.clone()).or_default();
        let memo = Memo {
            id: MemoId::generate(),
            topic_id: topic_id.clone(),
            timestamp: lifecycle::next_timestamp(revisions, now_timestamp()),
            latest: true,
            content: content.to_string(),
        };
        Ok(lifecycle::append_revision(revisions, memo))
    }

    async fn delete_memo(&self, topic_id: &TopicId, id: &MemoId) -> Result<usize, AppError> {
        let mut state = self.state.lock().await;
        let remaining = match state.memos.get_mut(topic_id) {
            Some(revisions) => lifecycle::remove_revision(revisions, id),
            None => 0,
        };
        if remaining == 0 {
            state.memos.remove(topic_id);
            state.tags.remove(topic_id);
        }
        Ok(remaining)
    }

    async fn list_tags(&self, topic_id: &TopicId) -> Result<Vec<String>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .tags
            .get(topic_id)
            .map(|tags| tags.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if !state.memos.get(topic_id).is_some_and(|r| !r.is_empty()) {
            return Err(AppError::Validation(format!(
                "Save memo before adding tag. '{}'",
                tag
            )));
        }
        if !state.tags.entry(topic_id.clone()).or_default().insert(tag.to_string()) {
            return Err(AppError::Conflict(format!("Tag {} already exists", tag)));
        }
        Ok(())
    }

    async fn remove_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let removed = state
            .tags
            .get_mut(topic_id)
            .map(|tags| tags.remove(tag))
            .unwrap_or(false);
        if !removed {
            return Err(AppError::NotFound(format!("Tag {} not found", tag)));
        }
        Ok(())
    }
}
