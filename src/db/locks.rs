//! Per-topic write serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::TopicId;

/// One async lock per topic id, created on demand.
///
/// Creates and deletes for the same topic run one at a time; different topics
/// proceed independently.
#[derive(Default)]
pub struct TopicLocks {
    locks: Mutex<HashMap<TopicId, Arc<AsyncMutex<()>>>>,
}

impl TopicLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `topic_id`.
    pub async fn acquire(&self, topic_id: &TopicId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Drop locks nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(topic_id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
