//! Instrumented backend for client-side tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::{Backend, MemoryBackend};
use crate::errors::AppError;
use crate::models::{Memo, MemoId, Topic, TopicId};

/// Wraps a [`MemoryBackend`], counting calls and optionally holding reads.
///
/// Reads of a held topic park until released, which lets tests choose the
/// order in which concurrent fetches arrive. Tag reads have their own gate so
/// they can be held alone.
#[derive(Default)]
pub struct GatedBackend {
    pub inner: MemoryBackend,
    calls: AtomicUsize,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    offline: Mutex<bool>,
}

const TOPIC_LIST_GATE: &str = "\0topics";

fn tags_gate(topic_id: &TopicId) -> String {
    format!("\0tags:{}", topic_id)
}

impl GatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn hold(&self, topic_id: &TopicId) {
        self.hold_gate(topic_id.as_str());
        self.hold_tags(topic_id);
    }

    pub fn release(&self, topic_id: &TopicId) {
        self.release_gate(topic_id.as_str());
        self.release_tags(topic_id);
    }

    /// Hold only the tag listing of `topic_id`.
    pub fn hold_tags(&self, topic_id: &TopicId) {
        self.hold_gate(&tags_gate(topic_id));
    }

    pub fn release_tags(&self, topic_id: &TopicId) {
        self.release_gate(&tags_gate(topic_id));
    }

    /// Make every call fail as if the store were unreachable.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    fn hold_gate(&self, key: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), Arc::new(Semaphore::new(0)));
    }

    fn release_gate(&self, key: &str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(key) {
            gate.close();
        }
    }

    async fn enter(&self, gate: &str) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let held = self.gates.lock().unwrap().get(gate).cloned();
        if let Some(gate) = held {
            // Closed on release; no permit is ever granted.
            let _ = gate.acquire().await;
        }
        if *self.offline.lock().unwrap() {
            return Err(AppError::BackendUnavailable("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for GatedBackend {
    async fn list_topics(&self, keyword: &str) -> Result<Vec<Topic>, AppError> {
        self.enter(TOPIC_LIST_GATE).await?;
        self.inner.list_topics(keyword).await
    }

    async fn get_memo(&self, topic_id: &TopicId, id: Option<&MemoId>) -> Result<Memo, AppError> {
        self.enter(topic_id.as_str()).await?;
        self.inner.get_memo(topic_id, id).await
    }

    async fn list_memos(&self, topic_id: &TopicId) -> Result<Vec<Memo>, AppError> {
        self.enter(topic_id.as_str()).await?;
        self.inner.list_memos(topic_id).await
    }

    async fn create_memo(&self, topic_id: &TopicId, content: &str) -> Result<Memo, AppError> {
        self.enter("").await?;
        self.inner.create_memo(topic_id, content).await
    }

    async fn delete_memo(&self, topic_id: &TopicId, id: &MemoId) -> Result<usize, AppError> {
        self.enter("").await?;
        self.inner.delete_memo(topic_id, id).await
    }

    async fn list_tags(&self, topic_id: &TopicId) -> Result<Vec<String>, AppError> {
        self.enter(&tags_gate(topic_id)).await?;
        self.inner.list_tags(topic_id).await
    }

    async fn add_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError> {
        self.enter("").await?;
        self.inner.add_tag(topic_id, tag).await
    }

    async fn remove_tag(&self, topic_id: &TopicId, tag: &str) -> Result<(), AppError> {
        self.enter("").await?;
        self.inner.remove_tag(topic_id, tag).await
    }
}
