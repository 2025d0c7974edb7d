//! The common ancestor of all views.
//!
//! `App` is the single actor of the client: it owns the session, the views and
//! every in-flight store call. User gestures enter through its methods, are
//! turned into events by the view they concern, and are handled here one at a
//! time. Store calls run as tasks; their results come back through
//! [`App::step`] and are applied only if still current.
//!
//! Confirmations and alerts leave through [`App::take_outbound`]; the answer to
//! a prompt comes back through [`App::answer`].

use std::collections::HashMap;

use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::client::RevisionStore;
use crate::errors::AppError;
use crate::events::{Event, EventBus, Signal, ViewId};
use crate::load::Ticket;
use crate::models::{validate_new_tag, Memo, MemoId, RevisionRef, Topic, TopicId};
use crate::session::{Answer, Decision, Guarded, PromptId, SaveTicket, Selection, Session, Transition};
use crate::views::{EditorSurface, HistoryList, Layout, StatusIndicator, TagPanel, TopicList, View};

/// A fetch result on its way back to the view that asked for it.
#[derive(Debug)]
pub enum Resolution {
    Topics(Ticket<String>, Result<Vec<Topic>, AppError>),
    History(Ticket<TopicId>, Result<Vec<Memo>, AppError>),
    Tags(Ticket<TopicId>, Result<Vec<String>, AppError>),
    Memo(Ticket<(TopicId, RevisionRef)>, Result<Memo, AppError>),
}

/// A finished store mutation.
#[derive(Debug)]
pub enum Completion {
    Saved(SaveTicket, Result<Memo, AppError>),
    Deleted(TopicId, MemoId, Result<usize, AppError>),
    TagAdded(TopicId, Result<String, AppError>),
    TagRemoved(TopicId, String, Result<(), AppError>),
}

#[derive(Debug)]
enum Input {
    Resolved(Resolution),
    Completed(Completion),
}

/// Something the shell must show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A yes/no question; answer with [`App::answer`].
    Prompt { id: PromptId, message: &'static str },
    /// A blocking notice.
    Alert(String),
}

pub struct App {
    store: RevisionStore,
    session: Session,
    topics: TopicList,
    history: HistoryList,
    tags: TagPanel,
    editor: EditorSurface,
    status: StatusIndicator,
    layout: Layout,
    bus: EventBus,
    tasks: JoinSet<Input>,
    outbox: Vec<Outbound>,
    prompt_origins: HashMap<PromptId, ViewId>,
}

impl App {
    /// A client showing a fresh, unsaved topic.
    pub fn new(store: RevisionStore, width: u32) -> Self {
        Self {
            store,
            session: Session::new(TopicId::generate()),
            topics: TopicList::new(),
            history: HistoryList::new(),
            tags: TagPanel::new(),
            editor: EditorSurface::new(),
            status: StatusIndicator::new(),
            layout: Layout::new(width),
            bus: EventBus::default(),
            tasks: JoinSet::new(),
            outbox: Vec::new(),
            prompt_origins: HashMap::new(),
        }
    }

    /// Issue the initial loads. Must run inside a Tokio runtime.
    pub fn start(&mut self) {
        tracing::info!(topic_id = %self.session.topic_id(), "Client starting");
        let ticket = self.topics.refresh();
        self.load_topics(ticket);
        let selection = self.session.selection().clone();
        self.apply_selection(&selection, false);
    }

    // Gestures

    pub fn click_topic(&mut self, topic_id: &TopicId) {
        let signal = self.topics.click(topic_id);
        self.raise(ViewId::TopicList, signal);
    }

    pub fn new_topic(&mut self) {
        self.raise(ViewId::TopicList, Signal::NewTopicRequest);
    }

    pub fn set_keyword(&mut self, keyword: &str) {
        self.raise(ViewId::TopicList, Signal::KeywordChanged(keyword.to_string()));
    }

    pub fn click_revision(&mut self, id: &MemoId) {
        let signal = self.history.click(id);
        self.raise(ViewId::HistoryList, signal);
    }

    pub fn delete_revision(&mut self, id: &MemoId) {
        let signal = self.history.delete_clicked(id);
        self.raise(ViewId::HistoryList, signal);
    }

    /// Content reported by the editing widget.
    pub fn edit(&mut self, content: &str) {
        if self.editor.edit(content) && self.session.mark_dirty() {
            self.raise(ViewId::Editor, Signal::DirtyChanged(true));
        }
    }

    pub fn save(&mut self) {
        self.raise(ViewId::Editor, Signal::SaveRequest);
    }

    pub fn begin_new_tag(&mut self) {
        self.tags.begin_new_tag();
    }

    pub fn cancel_new_tag(&mut self) {
        self.tags.discard_draft();
    }

    pub fn submit_tag(&mut self, text: &str) {
        let signal = self.tags.propose(text);
        self.raise(ViewId::TagPanel, signal);
    }

    pub fn remove_tag(&mut self, tag: &str) {
        let signal = self.tags.remove_clicked(tag);
        self.raise(ViewId::TagPanel, signal);
    }

    pub fn toggle_nav(&mut self) {
        let signal = self.layout.toggle_nav();
        self.raise(ViewId::Layout, signal);
    }

    pub fn toggle_attr(&mut self) {
        let signal = self.layout.toggle_attr();
        self.raise(ViewId::Layout, signal);
    }

    pub fn resize(&mut self, width: u32) {
        self.layout.resize(width);
    }

    /// The user's response to a prompt.
    pub fn answer(&mut self, id: PromptId, accepted: bool) {
        let origin = self.prompt_origins.remove(&id);
        let was_dirty = self.session.is_dirty();

        match self.session.answer(id, accepted) {
            Answer::Applied(selection) => {
                self.apply_selection(&selection, was_dirty);
                if was_dirty {
                    self.raise(ViewId::App, Signal::DirtyChanged(false));
                }
            }
            Answer::Proceed(action) => self.run_confirmed(action),
            Answer::Declined(action) => {
                tracing::debug!(?action, "Declined");
                if let Guarded::Transition(_) = action {
                    if let Some(view) = origin.and_then(|o| self.view_mut(o)) {
                        view.rollback();
                    }
                }
            }
            Answer::Unknown => tracing::debug!(?id, "Answer to a prompt that is not open"),
        }
    }

    pub fn take_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    // Driving

    /// Apply the next store result. Returns false when nothing is in flight.
    pub async fn step(&mut self) -> bool {
        match self.tasks.join_next().await {
            Some(Ok(input)) => {
                self.handle(input);
                true
            }
            Some(Err(e)) => {
                tracing::error!("Store task failed: {}", e);
                true
            }
            None => false,
        }
    }

    /// Apply store results until nothing is in flight.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    // Accessors

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn topic_list(&self) -> &TopicList {
        &self.topics
    }

    pub fn history(&self) -> &HistoryList {
        &self.history
    }

    pub fn tag_panel(&self) -> &TagPanel {
        &self.tags
    }

    pub fn editor(&self) -> &EditorSurface {
        &self.editor
    }

    pub fn status(&self) -> &StatusIndicator {
        &self.status
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    // Dispatch

    fn raise(&mut self, origin: ViewId, signal: Signal) {
        let mut event = Event::new(origin, signal);
        self.dispatch(&mut event);
        if let Some(view) = self.view_mut(origin) {
            view.after_dispatch(&event);
        }
        self.bus.emit(&event);
    }

    fn dispatch(&mut self, event: &mut Event) {
        tracing::debug!(event = event.name(), origin = ?event.origin(), "Dispatching");

        match event.signal().clone() {
            Signal::TopicSwitchRequest(topic_id) => {
                let decision = self.session.request(Transition::TopicSwitch(topic_id));
                self.decide(event, decision);
            }
            Signal::RevisionSwitchRequest(id) => {
                let decision = self.session.request(Transition::RevisionSwitch(id));
                self.decide(event, decision);
            }
            Signal::NewTopicRequest => {
                let decision = self.session.request(Transition::NewTopic);
                self.decide(event, decision);
            }
            Signal::RevisionCreated(memo) => {
                self.history.on_created(&memo);
                self.refresh_history();
                self.refresh_topics();
            }
            Signal::RevisionDeleted(remaining) => {
                self.refresh_history();
                self.refresh_topics();
                if remaining == 0 {
                    // The store dropped the topic's tags with its last revision.
                    let ticket = self.tags.refresh();
                    self.load_tags(ticket);
                }
            }
            Signal::TagAddRequest(text) => self.request_tag_add(event, &text),
            Signal::TagChanged(_) => {
                let ticket = self.tags.refresh();
                self.load_tags(ticket);
                self.refresh_topics();
            }
            Signal::KeywordChanged(keyword) => {
                let ticket = self.topics.set_keyword(&keyword);
                self.load_topics(ticket);
            }
            Signal::SaveRequest => self.save_current(),
            Signal::RevisionDeleteRequest(id) => {
                let topic_id = self.session.topic_id().clone();
                let decision = self.session.confirm(Guarded::DeleteRevision(topic_id, id));
                self.decide(event, decision);
            }
            Signal::TagRemoveRequest(tag) => {
                if !self.tags.is_loaded() {
                    self.alert(&format!("Tags are still loading. '{}'", tag));
                    event.cancel();
                } else if self.tags.tags().contains(&tag) {
                    let topic_id = self.session.topic_id().clone();
                    let decision = self.session.confirm(Guarded::RemoveTag(topic_id, tag));
                    self.decide(event, decision);
                } else {
                    self.alert(&format!("Unknown tag. '{}'", tag));
                    event.cancel();
                }
            }
            Signal::DirtyChanged(_) | Signal::PanelCollapsedChanged => {}
        }

        self.status.observe(event);
        self.layout.observe(event);
    }

    fn decide(&mut self, event: &mut Event, decision: Decision) {
        match decision {
            Decision::Applied(selection) => self.apply_selection(&selection, false),
            Decision::NeedsConfirmation(prompt) => {
                self.prompt_origins.insert(prompt.id, event.origin());
                self.outbox.push(Outbound::Prompt {
                    id: prompt.id,
                    message: prompt.message(),
                });
            }
            Decision::Vetoed => {
                event.cancel();
            }
        }
    }

    fn view_mut(&mut self, id: ViewId) -> Option<&mut dyn View> {
        match id {
            ViewId::TopicList => Some(&mut self.topics),
            ViewId::HistoryList => Some(&mut self.history),
            ViewId::TagPanel => Some(&mut self.tags),
            ViewId::Editor => Some(&mut self.editor),
            ViewId::StatusIndicator => Some(&mut self.status),
            ViewId::Layout => Some(&mut self.layout),
            ViewId::App => None,
        }
    }

    /// Point every view at `selection`. With `discard`, unsaved text is
    /// dropped even when the editor already shows that revision.
    fn apply_selection(&mut self, selection: &Selection, discard: bool) {
        let ticket = match self.editor.set_selection(selection) {
            Some(ticket) => Some(ticket),
            None if discard => self.editor.discard_edits(),
            None => None,
        };
        self.load_memo(ticket);

        let ticket = self.history.set_topic(&selection.topic_id);
        self.load_history(ticket);
        self.history.sync_selection(selection);

        let ticket = self.tags.set_topic(&selection.topic_id);
        self.load_tags(ticket);

        self.topics.sync_selection(selection);
    }

    fn request_tag_add(&mut self, event: &mut Event, text: &str) {
        let topic_id = self.session.topic_id().clone();
        let saved = self.editor.memo().is_some_and(|memo| memo.is_saved());

        let checked = if !self.tags.is_loaded() {
            Err(AppError::Validation(format!(
                "Tags are still loading. '{}'",
                text.trim()
            )))
        } else if saved {
            validate_new_tag(&topic_id, text, self.tags.tags())
        } else {
            Err(AppError::Validation(format!(
                "Save memo before adding tag. '{}'",
                text.trim()
            )))
        };

        match checked {
            Ok(tag) => {
                let decision = self.session.confirm(Guarded::AddTag(topic_id, tag));
                self.decide(event, decision);
            }
            Err(e) => {
                self.alert(e.message());
                event.cancel();
            }
        }
    }

    fn save_current(&mut self) {
        let Some(ticket) = self.session.begin_save() else {
            tracing::debug!("Nothing to save");
            return;
        };
        let content = self.editor.content().to_string();
        let store = self.store.clone();
        self.tasks.spawn(async move {
            let result = store.create_revision(&ticket.topic_id, &content).await;
            Input::Completed(Completion::Saved(ticket, result))
        });
    }

    fn run_confirmed(&mut self, action: Guarded) {
        let store = self.store.clone();
        match action {
            Guarded::Transition(_) => {}
            Guarded::DeleteRevision(topic_id, id) => {
                self.tasks.spawn(async move {
                    let result = store.delete_revision(&topic_id, &id).await;
                    Input::Completed(Completion::Deleted(topic_id, id, result))
                });
            }
            Guarded::AddTag(topic_id, tag) => {
                let known = self.tags.tags().to_vec();
                self.tasks.spawn(async move {
                    let result = store.add_tag(&topic_id, &tag, &known).await;
                    Input::Completed(Completion::TagAdded(topic_id, result))
                });
            }
            Guarded::RemoveTag(topic_id, tag) => {
                let known = self.tags.tags().to_vec();
                self.tasks.spawn(async move {
                    let result = store.remove_tag(&topic_id, &tag, &known).await;
                    Input::Completed(Completion::TagRemoved(topic_id, tag, result))
                });
            }
        }
    }

    fn alert(&mut self, message: &str) {
        tracing::info!(message, "Alert");
        self.outbox.push(Outbound::Alert(message.to_string()));
    }

    /// Mutation failures: validation goes to the user, the rest inline.
    fn fail(&mut self, error: AppError) {
        if error.is_unavailable() {
            self.status.report(error);
        } else {
            self.alert(error.message());
        }
    }

    // Results

    fn handle(&mut self, input: Input) {
        match input {
            Input::Resolved(resolution) => self.resolve(resolution),
            Input::Completed(completion) => self.complete(completion),
        }
    }

    fn resolve(&mut self, resolution: Resolution) {
        let accepted = match resolution {
            Resolution::Topics(ticket, result) => self.topics.resolve(&ticket, result),
            Resolution::History(ticket, result) => self.history.resolve(&ticket, result),
            Resolution::Tags(ticket, result) => self.tags.resolve(&ticket, result),
            Resolution::Memo(ticket, result) => self.editor.resolve(&ticket, result),
        };
        if !accepted {
            tracing::trace!("Stale result dropped");
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Saved(ticket, Ok(memo)) => {
                let cleared = self.session.on_saved(&ticket, &memo);
                if &memo.topic_id == self.session.topic_id() {
                    self.editor.adopt(&memo);
                    self.history.sync_selection(self.session.selection());
                    self.topics.sync_selection(self.session.selection());
                }
                self.raise(ViewId::App, Signal::RevisionCreated(memo));
                if cleared {
                    self.raise(ViewId::App, Signal::DirtyChanged(false));
                }
            }
            Completion::Deleted(topic_id, id, Ok(remaining)) => {
                self.history.on_deleted(&topic_id, &id);
                if let Some(selection) = self.session.on_deleted(&topic_id, &id) {
                    if self.session.is_dirty() {
                        // Unsaved text stays; the next save appends it.
                        self.history.sync_selection(&selection);
                        self.topics.sync_selection(&selection);
                    } else {
                        self.apply_selection(&selection, false);
                    }
                }
                let displayed = self.editor.memo().is_some_and(|memo| memo.id == id);
                if displayed && !self.session.is_dirty() {
                    let ticket = self.editor.reload();
                    self.load_memo(ticket);
                }
                self.raise(ViewId::App, Signal::RevisionDeleted(remaining));
            }
            Completion::TagAdded(topic_id, Ok(tag)) => {
                if &topic_id == self.session.topic_id() {
                    self.tags.on_added(&tag);
                }
                self.raise(ViewId::App, Signal::TagChanged(tag));
            }
            Completion::TagRemoved(topic_id, tag, Ok(())) => {
                if &topic_id == self.session.topic_id() {
                    self.tags.on_removed(&tag);
                }
                self.raise(ViewId::App, Signal::TagChanged(tag));
            }
            Completion::Saved(_, Err(e))
            | Completion::Deleted(_, _, Err(e))
            | Completion::TagAdded(_, Err(e))
            | Completion::TagRemoved(_, _, Err(e)) => self.fail(e),
        }
    }

    // Loads

    fn refresh_topics(&mut self) {
        let ticket = self.topics.refresh();
        self.load_topics(ticket);
    }

    fn refresh_history(&mut self) {
        let ticket = self.history.refresh();
        self.load_history(ticket);
    }

    fn load_topics(&mut self, ticket: Option<Ticket<String>>) {
        let Some(ticket) = ticket else { return };
        let store = self.store.clone();
        self.tasks.spawn(async move {
            let result = store.list_topics(ticket.key()).await;
            Input::Resolved(Resolution::Topics(ticket, result))
        });
    }

    fn load_history(&mut self, ticket: Option<Ticket<TopicId>>) {
        let Some(ticket) = ticket else { return };
        let store = self.store.clone();
        self.tasks.spawn(async move {
            let result = store.list_revision_history(ticket.key()).await;
            Input::Resolved(Resolution::History(ticket, result))
        });
    }

    fn load_tags(&mut self, ticket: Option<Ticket<TopicId>>) {
        let Some(ticket) = ticket else { return };
        let store = self.store.clone();
        self.tasks.spawn(async move {
            let result = store.list_tags(ticket.key()).await;
            Input::Resolved(Resolution::Tags(ticket, result))
        });
    }

    fn load_memo(&mut self, ticket: Option<Ticket<(TopicId, RevisionRef)>>) {
        let Some(ticket) = ticket else { return };
        let store = self.store.clone();
        self.tasks.spawn(async move {
            let (topic_id, revision) = ticket.key();
            let result = store.get_revision(topic_id, revision).await;
            Input::Resolved(Resolution::Memo(ticket, result))
        });
    }
}
