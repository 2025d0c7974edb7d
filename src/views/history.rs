//! Revision history of the displayed topic, newest first.

use super::View;
use crate::errors::AppError;
use crate::events::{Signal, ViewId};
use crate::lifecycle;
use crate::load::{LoadCell, LoadState, Ticket};
use crate::models::{Memo, MemoId, RevisionRef, TopicId};
use crate::session::Selection;

pub struct HistoryList {
    cell: LoadCell<TopicId, Vec<Memo>>,
    revisions: Vec<Memo>,
    selected: RevisionRef,
    previous: Vec<RevisionRef>,
}

impl HistoryList {
    pub fn new() -> Self {
        Self {
            cell: LoadCell::new("history"),
            revisions: Vec::new(),
            selected: RevisionRef::Latest,
            previous: Vec::new(),
        }
    }

    pub fn set_topic(&mut self, topic_id: &TopicId) -> Option<Ticket<TopicId>> {
        let ticket = self.cell.set_key(topic_id.clone())?;
        self.revisions.clear();
        Some(ticket)
    }

    pub fn refresh(&mut self) -> Option<Ticket<TopicId>> {
        self.cell.rerun()
    }

    pub fn resolve(&mut self, ticket: &Ticket<TopicId>, result: Result<Vec<Memo>, AppError>) -> bool {
        if !self.cell.resolve(ticket, result) {
            return false;
        }
        if let Some(revisions) = self.cell.value() {
            self.revisions = revisions;
        }
        true
    }

    /// Reflect a store-side create before the refresh lands.
    pub fn on_created(&mut self, memo: &Memo) {
        if self.cell.key() == Some(&memo.topic_id) {
            lifecycle::mirror_created(&mut self.revisions, memo);
        }
    }

    /// Reflect a store-side delete before the refresh lands.
    pub fn on_deleted(&mut self, topic_id: &TopicId, id: &MemoId) {
        if self.cell.key() == Some(topic_id) {
            lifecycle::mirror_deleted(&mut self.revisions, id);
        }
    }

    pub fn click(&mut self, id: &MemoId) -> Signal {
        self.previous.push(self.selected.clone());
        self.selected = RevisionRef::Id(id.clone());
        Signal::RevisionSwitchRequest(id.clone())
    }

    pub fn delete_clicked(&self, id: &MemoId) -> Signal {
        Signal::RevisionDeleteRequest(id.clone())
    }

    pub fn sync_selection(&mut self, selection: &Selection) {
        self.previous.clear();
        self.selected = selection.revision.clone();
    }

    pub fn revisions(&self) -> &[Memo] {
        &self.revisions
    }

    pub fn is_selected(&self, memo: &Memo) -> bool {
        match &self.selected {
            RevisionRef::Latest => memo.latest,
            RevisionRef::Id(id) => &memo.id == id,
        }
    }

    pub fn state(&self) -> LoadState<Vec<Memo>> {
        self.cell.state()
    }

    pub fn error(&self) -> Option<AppError> {
        self.cell.error()
    }
}

impl Default for HistoryList {
    fn default() -> Self {
        Self::new()
    }
}

impl View for HistoryList {
    fn id(&self) -> ViewId {
        ViewId::HistoryList
    }

    fn rollback(&mut self) {
        if let Some(previous) = self.previous.pop() {
            self.selected = previous;
        }
    }
}
