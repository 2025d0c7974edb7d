//! The editing surface's model.
//!
//! The widget itself is external: it receives content and a read-only flag and
//! reports content changes back.

use super::View;
use crate::errors::AppError;
use crate::events::ViewId;
use crate::load::{LoadCell, LoadState, Ticket};
use crate::models::{Memo, RevisionRef, TopicId};
use crate::session::Selection;

type MemoKey = (TopicId, RevisionRef);

pub struct EditorSurface {
    cell: LoadCell<MemoKey, Memo>,
    content: String,
    read_only: bool,
}

impl EditorSurface {
    pub fn new() -> Self {
        Self {
            cell: LoadCell::new("memo"),
            content: String::new(),
            read_only: true,
        }
    }

    /// Load the selected revision. Editing is blocked until it arrives.
    pub fn set_selection(&mut self, selection: &Selection) -> Option<Ticket<MemoKey>> {
        let ticket = self
            .cell
            .set_key((selection.topic_id.clone(), selection.revision.clone()))?;
        self.content.clear();
        self.read_only = true;
        Some(ticket)
    }

    pub fn reload(&mut self) -> Option<Ticket<MemoKey>> {
        let ticket = self.cell.rerun()?;
        self.read_only = true;
        Some(ticket)
    }

    /// Throw away unsaved text and show the loaded revision again. Refetches
    /// only when there is no loaded revision to fall back on.
    pub fn discard_edits(&mut self) -> Option<Ticket<MemoKey>> {
        match self.cell.value() {
            Some(memo) => {
                self.content = memo.content;
                self.read_only = !memo.latest;
                None
            }
            None => self.reload(),
        }
    }

    /// Programmatic load; never counts as an edit.
    pub fn resolve(&mut self, ticket: &Ticket<MemoKey>, result: Result<Memo, AppError>) -> bool {
        if !self.cell.resolve(ticket, result) {
            return false;
        }
        match self.cell.value() {
            Some(memo) => {
                self.content = memo.content;
                self.read_only = !memo.latest;
            }
            None => self.read_only = true,
        }
        true
    }

    /// Take over a revision this editor just saved, keeping the current text.
    pub fn adopt(&mut self, memo: &Memo) {
        self.cell.prime(
            (memo.topic_id.clone(), RevisionRef::Id(memo.id.clone())),
            memo.clone(),
        );
        self.read_only = false;
    }

    /// A content change from the widget. Returns true if it is a genuine edit.
    pub fn edit(&mut self, content: &str) -> bool {
        if self.read_only {
            tracing::debug!("Ignoring edit of a read-only revision");
            return false;
        }
        if self.content == content {
            return false;
        }
        self.content = content.to_string();
        true
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The revision on display, once loaded.
    pub fn memo(&self) -> Option<Memo> {
        self.cell.value()
    }

    pub fn state(&self) -> LoadState<Memo> {
        self.cell.state()
    }

    pub fn error(&self) -> Option<AppError> {
        self.cell.error()
    }
}

impl Default for EditorSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl View for EditorSurface {
    fn id(&self) -> ViewId {
        ViewId::Editor
    }
}
