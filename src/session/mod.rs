//! Selection and discard guard.
//!
//! The session owns which topic and revision are displayed and whether the
//! editor holds unsaved changes. Every selection change goes through
//! [`Session::request`]; with unsaved changes the user must confirm before the
//! edit is thrown away. Destructive actions (revision delete, tag add and
//! remove) also go through a confirmation prompt.
//!
//! Prompts are asynchronous: a request that needs confirmation returns the
//! prompt and the session waits for [`Session::answer`]. While a prompt is open
//! further guarded requests are vetoed.

use crate::models::{Memo, MemoId, RevisionRef, TopicId};

/// Which topic is displayed, and which of its revisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub topic_id: TopicId,
    pub revision: RevisionRef,
}

impl Selection {
    pub fn latest(topic_id: TopicId) -> Self {
        Self {
            topic_id,
            revision: RevisionRef::Latest,
        }
    }
}

/// A requested selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    TopicSwitch(TopicId),
    RevisionSwitch(MemoId),
    NewTopic,
}

/// An action held back until the user confirms it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded {
    Transition(Transition),
    DeleteRevision(TopicId, MemoId),
    AddTag(TopicId, String),
    RemoveTag(TopicId, String),
}

impl Guarded {
    /// The question put to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Guarded::Transition(_) => "Discard changes ?",
            Guarded::DeleteRevision(..) => "Delete ?",
            Guarded::AddTag(..) => "Add ?",
            Guarded::RemoveTag(..) => "Remove ?",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub id: PromptId,
    pub action: Guarded,
}

impl Prompt {
    pub fn message(&self) -> &'static str {
        self.action.message()
    }
}

/// Outcome of offering an action to the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Selection changed; reload whatever depends on it.
    Applied(Selection),
    /// Ask the user; nothing changes until answered.
    NeedsConfirmation(Prompt),
    /// Refused outright; the requester rolls back.
    Vetoed,
}

/// Outcome of answering a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// A confirmed transition was applied.
    Applied(Selection),
    /// A confirmed non-selection action may now run.
    Proceed(Guarded),
    Declined(Guarded),
    /// Not the prompt currently open.
    Unknown,
}

/// Issued when a save starts; handed back when it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub topic_id: TopicId,
    epoch: u64,
}

#[derive(Debug)]
pub struct Session {
    selection: Selection,
    dirty: bool,
    /// Bumped on every content change.
    edit_epoch: u64,
    prompt: Option<Prompt>,
    next_prompt: u64,
}

impl Session {
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            selection: Selection::latest(topic_id),
            dirty: false,
            edit_epoch: 0,
            prompt: None,
            next_prompt: 0,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn topic_id(&self) -> &TopicId {
        &self.selection.topic_id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn open_prompt(&self) -> Option<&Prompt> {
        self.prompt.as_ref()
    }

    /// Record a genuine content change. Returns true if `dirty` flipped.
    pub fn mark_dirty(&mut self) -> bool {
        self.edit_epoch += 1;
        let changed = !self.dirty;
        self.dirty = true;
        changed
    }

    /// Offer a selection change to the guard.
    pub fn request(&mut self, transition: Transition) -> Decision {
        if self.prompt.is_some() {
            tracing::debug!(?transition, "Vetoed while a prompt is open");
            return Decision::Vetoed;
        }
        if !self.dirty {
            return Decision::Applied(self.apply(transition));
        }
        tracing::debug!(?transition, "Unsaved changes, asking to discard");
        Decision::NeedsConfirmation(self.ask(Guarded::Transition(transition)))
    }

    /// Ask before running a destructive action.
    pub fn confirm(&mut self, action: Guarded) -> Decision {
        if self.prompt.is_some() {
            tracing::debug!(?action, "Vetoed while a prompt is open");
            return Decision::Vetoed;
        }
        Decision::NeedsConfirmation(self.ask(action))
    }

    pub fn answer(&mut self, id: PromptId, accepted: bool) -> Answer {
        match self.prompt.take() {
            Some(prompt) if prompt.id == id => {
                tracing::debug!(action = ?prompt.action, accepted, "Prompt answered");
                match (prompt.action, accepted) {
                    (action, false) => Answer::Declined(action),
                    (Guarded::Transition(transition), true) => {
                        Answer::Applied(self.apply(transition))
                    }
                    (action, true) => Answer::Proceed(action),
                }
            }
            other => {
                self.prompt = other;
                Answer::Unknown
            }
        }
    }

    /// Start a save of the current content, or `None` when nothing changed.
    pub fn begin_save(&self) -> Option<SaveTicket> {
        self.dirty.then(|| SaveTicket {
            topic_id: self.selection.topic_id.clone(),
            epoch: self.edit_epoch,
        })
    }

    /// Apply a completed save.
    ///
    /// The new revision becomes the active one if its topic is still displayed.
    /// `dirty` clears only when no edit happened after the save started. Returns
    /// true if `dirty` flipped.
    pub fn on_saved(&mut self, ticket: &SaveTicket, memo: &Memo) -> bool {
        if memo.topic_id != self.selection.topic_id {
            tracing::debug!(topic_id = %memo.topic_id, "Saved topic is no longer displayed");
            return false;
        }
        self.selection.revision = RevisionRef::Id(memo.id.clone());
        if self.dirty && ticket.epoch == self.edit_epoch {
            self.dirty = false;
            return true;
        }
        false
    }

    /// Apply a completed delete. Returns the new selection if it changed.
    ///
    /// A deleted active revision falls back to the topic's latest.
    pub fn on_deleted(&mut self, topic_id: &TopicId, id: &MemoId) -> Option<Selection> {
        if topic_id != &self.selection.topic_id {
            return None;
        }
        if self.selection.revision.id() == Some(id) {
            self.selection.revision = RevisionRef::Latest;
            return Some(self.selection.clone());
        }
        None
    }

    fn ask(&mut self, action: Guarded) -> Prompt {
        self.next_prompt += 1;
        let prompt = Prompt {
            id: PromptId(self.next_prompt),
            action,
        };
        self.prompt = Some(prompt.clone());
        prompt
    }

    fn apply(&mut self, transition: Transition) -> Selection {
        self.dirty = false;
        self.selection = match transition {
            Transition::TopicSwitch(topic_id) => Selection::latest(topic_id),
            Transition::RevisionSwitch(id) => Selection {
                topic_id: self.selection.topic_id.clone(),
                revision: RevisionRef::Id(id),
            },
            Transition::NewTopic => Selection::latest(TopicId::generate()),
        };
        tracing::debug!(selection = ?self.selection, "Selection changed");
        self.selection.clone()
    }
}
