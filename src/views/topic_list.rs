//! Topic list, filtered by the search keyword.

use super::View;
use crate::errors::AppError;
use crate::events::{Signal, ViewId};
use crate::load::{LoadCell, LoadState, Ticket};
use crate::models::{Topic, TopicId};
use crate::session::Selection;

pub struct TopicList {
    cell: LoadCell<String, Vec<Topic>>,
    topics: Vec<Topic>,
    highlighted: Option<TopicId>,
    /// Highlights to restore, one per click still being decided.
    previous: Vec<Option<TopicId>>,
}

impl TopicList {
    pub fn new() -> Self {
        Self {
            cell: LoadCell::new("topics"),
            topics: Vec::new(),
            highlighted: None,
            previous: Vec::new(),
        }
    }

    pub fn set_keyword(&mut self, keyword: &str) -> Option<Ticket<String>> {
        let ticket = self.cell.set_key(keyword.to_string())?;
        self.topics.clear();
        Some(ticket)
    }

    /// Reload with the current keyword (all topics if none was set).
    pub fn refresh(&mut self) -> Option<Ticket<String>> {
        if self.cell.key().is_some() {
            self.cell.rerun()
        } else {
            self.set_keyword("")
        }
    }

    pub fn resolve(&mut self, ticket: &Ticket<String>, result: Result<Vec<Topic>, AppError>) -> bool {
        if !self.cell.resolve(ticket, result) {
            return false;
        }
        if let Some(topics) = self.cell.value() {
            self.topics = topics;
        }
        true
    }

    /// A click on a topic. Clicking the highlighted topic asks for a new one.
    pub fn click(&mut self, topic_id: &TopicId) -> Signal {
        self.previous.push(self.highlighted.clone());
        if self.highlighted.as_ref() == Some(topic_id) {
            self.highlighted = None;
            Signal::NewTopicRequest
        } else {
            self.highlighted = Some(topic_id.clone());
            Signal::TopicSwitchRequest(topic_id.clone())
        }
    }

    pub fn sync_selection(&mut self, selection: &Selection) {
        self.previous.clear();
        self.highlighted = Some(selection.topic_id.clone());
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn keyword(&self) -> Option<&str> {
        self.cell.key().map(String::as_str)
    }

    pub fn highlighted(&self) -> Option<&TopicId> {
        self.highlighted.as_ref()
    }

    pub fn state(&self) -> LoadState<Vec<Topic>> {
        self.cell.state()
    }

    pub fn error(&self) -> Option<AppError> {
        self.cell.error()
    }
}

impl Default for TopicList {
    fn default() -> Self {
        Self::new()
    }
}

impl View for TopicList {
    fn id(&self) -> ViewId {
        ViewId::TopicList
    }

    fn rollback(&mut self) {
        if let Some(previous) = self.previous.pop() {
            self.highlighted = previous;
        }
    }
}
