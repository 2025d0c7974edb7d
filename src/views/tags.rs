//! Tags of the displayed topic, plus the "new tag" input.

use super::View;
use crate::errors::AppError;
use crate::events::{Signal, ViewId};
use crate::load::{LoadCell, LoadState, Ticket};
use crate::models::TopicId;

/// One chip in the tag panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEntry {
    Tag(String),
    /// Placeholder being typed into; not a stored tag.
    NewTag(String),
}

pub struct TagPanel {
    cell: LoadCell<TopicId, Vec<String>>,
    tags: Vec<String>,
    draft: Option<String>,
}

impl TagPanel {
    pub fn new() -> Self {
        Self {
            cell: LoadCell::new("tags"),
            tags: Vec::new(),
            draft: None,
        }
    }

    pub fn set_topic(&mut self, topic_id: &TopicId) -> Option<Ticket<TopicId>> {
        let ticket = self.cell.set_key(topic_id.clone())?;
        self.tags.clear();
        self.draft = None;
        Some(ticket)
    }

    pub fn refresh(&mut self) -> Option<Ticket<TopicId>> {
        self.cell.rerun()
    }

    pub fn resolve(&mut self, ticket: &Ticket<TopicId>, result: Result<Vec<String>, AppError>) -> bool {
        if !self.cell.resolve(ticket, result) {
            return false;
        }
        if let Some(tags) = self.cell.value() {
            self.tags = tags;
        }
        true
    }

    /// Show the empty "new tag" placeholder.
    pub fn begin_new_tag(&mut self) {
        self.draft.get_or_insert_with(String::new);
    }

    pub fn discard_draft(&mut self) {
        self.draft = None;
    }

    /// Submit `text` from the placeholder.
    pub fn propose(&mut self, text: &str) -> Signal {
        self.draft = Some(text.to_string());
        Signal::TagAddRequest(text.to_string())
    }

    pub fn remove_clicked(&self, tag: &str) -> Signal {
        Signal::TagRemoveRequest(tag.to_string())
    }

    /// The store accepted `tag`.
    pub fn on_added(&mut self, tag: &str) {
        self.draft = None;
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn on_removed(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    /// True once the current topic's tags have arrived.
    pub fn is_loaded(&self) -> bool {
        matches!(self.cell.state(), LoadState::Ready(_))
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// Chips in display order, the placeholder last.
    pub fn entries(&self) -> Vec<TagEntry> {
        self.tags
            .iter()
            .cloned()
            .map(TagEntry::Tag)
            .chain(self.draft.clone().map(TagEntry::NewTag))
            .collect()
    }

    pub fn state(&self) -> LoadState<Vec<String>> {
        self.cell.state()
    }

    pub fn error(&self) -> Option<AppError> {
        self.cell.error()
    }
}

impl Default for TagPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl View for TagPanel {
    fn id(&self) -> ViewId {
        ViewId::TagPanel
    }

    // A refused tag stays in the placeholder so it can be corrected.
}
