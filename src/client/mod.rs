//! Revision store client.
//!
//! A typed façade over a [`Backend`]. Tag mutations are checked against the
//! caller's view of the topic's tags before the store is contacted, since the
//! store itself rejects duplicates and missing tags.

use std::sync::Arc;

use crate::backend::Backend;
use crate::errors::AppError;
use crate::models::{validate_new_tag, Memo, MemoId, RevisionRef, Topic, TopicId};

#[derive(Clone)]
pub struct RevisionStore {
    backend: Arc<dyn Backend>,
}

impl RevisionStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Topics matching `keyword`, newest first.
    pub async fn list_topics(&self, keyword: &str) -> Result<Vec<Topic>, AppError> {
        tracing::debug!(keyword, "Listing topics");
        self.backend
            .list_topics(keyword)
            .await
            .inspect_err(|e| tracing::warn!("Listing topics failed: {}", e))
    }

    /// The selected revision of a topic, or the empty memo for an unsaved topic.
    pub async fn get_revision(
        &self,
        topic_id: &TopicId,
        revision: &RevisionRef,
    ) -> Result<Memo, AppError> {
        tracing::debug!(topic_id = %topic_id, revision = ?revision, "Loading revision");
        self.backend
            .get_memo(topic_id, revision.id())
            .await
            .inspect_err(|e| tracing::warn!(topic_id = %topic_id, "Loading revision failed: {}", e))
    }

    /// All revisions of a topic, newest first.
    pub async fn list_revision_history(&self, topic_id: &TopicId) -> Result<Vec<Memo>, AppError> {
        tracing::debug!(topic_id = %topic_id, "Loading revision history");
        self.backend
            .list_memos(topic_id)
            .await
            .inspect_err(|e| tracing::warn!(topic_id = %topic_id, "Loading history failed: {}", e))
    }

    pub async fn create_revision(&self, topic_id: &TopicId, content: &str) -> Result<Memo, AppError> {
        let memo = self
            .backend
            .create_memo(topic_id, content)
            .await
            .inspect_err(|e| tracing::warn!(topic_id = %topic_id, "Saving revision failed: {}", e))?;
        tracing::info!(topic_id = %topic_id, memo_id = %memo.id, "Revision saved");
        Ok(memo)
    }

    /// Delete a revision; returns how many remain (0 means the topic is gone).
    pub async fn delete_revision(&self, topic_id: &TopicId, id: &MemoId) -> Result<usize, AppError> {
        let remaining = self
            .backend
            .delete_memo(topic_id, id)
            .await
            .inspect_err(|e| tracing::warn!(topic_id = %topic_id, "Deleting revision failed: {}", e))?;
        tracing::info!(topic_id = %topic_id, memo_id = %id, remaining, "Revision deleted");
        Ok(remaining)
    }

    pub async fn list_tags(&self, topic_id: &TopicId) -> Result<Vec<String>, AppError> {
        tracing::debug!(topic_id = %topic_id, "Loading tags");
        self.backend
            .list_tags(topic_id)
            .await
            .inspect_err(|e| tracing::warn!(topic_id = %topic_id, "Loading tags failed: {}", e))
    }

    /// Validate and add a tag; returns the tag as stored.
    ///
    /// Invalid or already known tags fail with [`AppError::Validation`] and never
    /// reach the backend.
    pub async fn add_tag(
        &self,
        topic_id: &TopicId,
        candidate: &str,
        known: &[String],
    ) -> Result<String, AppError> {
        let tag = validate_new_tag(topic_id, candidate, known)?;
        self.backend
            .add_tag(topic_id, &tag)
            .await
            .inspect_err(|e| tracing::warn!(topic_id = %topic_id, tag = %tag, "Adding tag failed: {}", e))?;
        tracing::info!(topic_id = %topic_id, tag = %tag, "Tag added");
        Ok(tag)
    }

    /// Remove a tag the caller knows to be present.
    pub async fn remove_tag(
        &self,
        topic_id: &TopicId,
        tag: &str,
        known: &[String],
    ) -> Result<(), AppError> {
        if !known.iter().any(|t| t == tag) {
            return Err(AppError::Validation(format!("Unknown tag. '{}'", tag)));
        }
        self.backend
            .remove_tag(topic_id, tag)
            .await
            .inspect_err(|e| tracing::warn!(topic_id = %topic_id, tag = %tag, "Removing tag failed: {}", e))?;
        tracing::info!(topic_id = %topic_id, tag = %tag, "Tag removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::GatedBackend;
    use crate::backend::MemoryBackend;
    use crate::lifecycle;

    fn store() -> (Arc<GatedBackend>, RevisionStore) {
        let backend = Arc::new(GatedBackend::new());
        (backend.clone(), RevisionStore::new(backend))
    }

    #[tokio::test]
    async fn test_create_then_get_latest() {
        let (_, store) = store();
        let topic = TopicId::generate();

        store.create_revision(&topic, "x").await.unwrap();
        let memo = store.get_revision(&topic, &RevisionRef::Latest).await.unwrap();

        assert_eq!(memo.content, "x");
        assert!(memo.latest);
    }

    #[tokio::test]
    async fn test_unsaved_topic_yields_empty_memo() {
        let (_, store) = store();
        let topic = TopicId::generate();

        let memo = store.get_revision(&topic, &RevisionRef::Latest).await.unwrap();

        assert_eq!(memo, Memo::empty(topic));
    }

    #[tokio::test]
    async fn test_delete_latest_promotes_previous() {
        let backend = Arc::new(MemoryBackend::new());
        let topic = TopicId::from("T");
        backend.insert_at(&topic, 100, "v1").await;
        let v2 = backend.insert_at(&topic, 200, "v2").await;
        assert!(v2.latest);
        let store = RevisionStore::new(backend);

        let remaining = store.delete_revision(&topic, &v2.id).await.unwrap();
        let memo = store.get_revision(&topic, &RevisionRef::Latest).await.unwrap();

        assert_eq!(remaining, 1);
        assert_eq!(memo.content, "v1");
        assert!(memo.latest);
    }

    #[tokio::test]
    async fn test_delete_only_revision_empties_topic() {
        let (_, store) = store();
        let topic = TopicId::generate();
        let memo = store.create_revision(&topic, "only").await.unwrap();

        let remaining = store.delete_revision(&topic, &memo.id).await.unwrap();
        let after = store.get_revision(&topic, &RevisionRef::Latest).await.unwrap();

        assert_eq!(remaining, 0);
        assert_eq!(after, Memo::empty(topic.clone()));
        assert!(store.list_topics("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_keeps_single_latest() {
        let (_, store) = store();
        let topic = TopicId::generate();
        for content in ["a", "b", "c"] {
            store.create_revision(&topic, content).await.unwrap();
        }

        let history = store.list_revision_history(&topic).await.unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "c");
        lifecycle::check_latest_invariant(&history).unwrap();
    }

    #[tokio::test]
    async fn test_invalid_tags_never_reach_backend() {
        let (backend, store) = store();
        let topic = TopicId::generate();
        let known = vec!["rust".to_string()];

        for candidate in ["a b", "x", "rust"] {
            let err = store.add_tag(&topic, candidate, &known).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{candidate}: {err}");
        }
        let err = store
            .add_tag(&TopicId::new(""), "rust", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_add_and_remove_tag() {
        let (backend, store) = store();
        let topic = TopicId::generate();
        backend.inner.create_memo(&topic, "memo").await.unwrap();

        let tag = store.add_tag(&topic, " rust ", &[]).await.unwrap();
        assert_eq!(tag, "rust");
        let tags = store.list_tags(&topic).await.unwrap();
        assert_eq!(tags, vec!["rust".to_string()]);

        store.remove_tag(&topic, "rust", &tags).await.unwrap();
        assert!(store.list_tags(&topic).await.unwrap().is_empty());
        assert_eq!(backend.calls(), 4);
    }

    #[tokio::test]
    async fn test_remove_unknown_tag_is_rejected_locally() {
        let (backend, store) = store();

        let err = store
            .remove_tag(&TopicId::generate(), "rust", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_unavailable() {
        let (backend, store) = store();
        backend.set_offline(true);

        let err = store.list_topics("").await.unwrap_err();

        assert!(err.is_unavailable());
    }
}
