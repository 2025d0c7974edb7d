//! Signals exchanged between views.
//!
//! Views never reach into each other. They raise an [`Event`] carrying a
//! [`Signal`]; the common ancestor handles it and may cancel a transition
//! request, after which the origin view checks [`Event::is_cancelled`] and
//! rolls back its own optimistic state. Facts (a revision was created, a tag
//! changed) are never cancelled; observers refresh their own queries from them.
//!
//! Every dispatched event is published on an [`EventBus`] once handling is
//! complete, so outside observers see the final cancelled flag.

use tokio::sync::broadcast;

use crate::models::{Memo, MemoId, TopicId};

/// The view an event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    TopicList,
    HistoryList,
    TagPanel,
    Editor,
    StatusIndicator,
    Layout,
    /// The ancestor itself, for facts it raises after store calls.
    App,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    TopicSwitchRequest(TopicId),
    RevisionSwitchRequest(MemoId),
    NewTopicRequest,
    RevisionCreated(Memo),
    /// Remaining revision count of the topic.
    RevisionDeleted(usize),
    TagAddRequest(String),
    TagChanged(String),
    DirtyChanged(bool),
    PanelCollapsedChanged,
    KeywordChanged(String),
    SaveRequest,
    RevisionDeleteRequest(MemoId),
    TagRemoveRequest(String),
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::TopicSwitchRequest(_) => "topic-switch-request",
            Signal::RevisionSwitchRequest(_) => "revision-switch-request",
            Signal::NewTopicRequest => "new-topic-request",
            Signal::RevisionCreated(_) => "revision-created",
            Signal::RevisionDeleted(_) => "revision-deleted",
            Signal::TagAddRequest(_) => "tag-add-request",
            Signal::TagChanged(_) => "tag-changed",
            Signal::DirtyChanged(_) => "dirty-changed",
            Signal::PanelCollapsedChanged => "panel-collapsed-changed",
            Signal::KeywordChanged(_) => "keyword-changed",
            Signal::SaveRequest => "save-request",
            Signal::RevisionDeleteRequest(_) => "revision-delete-request",
            Signal::TagRemoveRequest(_) => "tag-remove-request",
        }
    }

    /// Requests may be vetoed; facts may not.
    pub fn is_cancelable(&self) -> bool {
        matches!(
            self,
            Signal::TopicSwitchRequest(_)
                | Signal::RevisionSwitchRequest(_)
                | Signal::NewTopicRequest
                | Signal::TagAddRequest(_)
                | Signal::RevisionDeleteRequest(_)
                | Signal::TagRemoveRequest(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    origin: ViewId,
    signal: Signal,
    cancelled: bool,
}

impl Event {
    pub fn new(origin: ViewId, signal: Signal) -> Self {
        Self {
            origin,
            signal,
            cancelled: false,
        }
    }

    pub fn origin(&self) -> ViewId {
        self.origin
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn name(&self) -> &'static str {
        self.signal.name()
    }

    /// Veto the request. Facts ignore this and return false.
    pub fn cancel(&mut self) -> bool {
        if self.signal.is_cancelable() {
            self.cancelled = true;
        }
        self.cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Broadcast of handled events.
///
/// Slow subscribers lag and miss events rather than holding up the ancestor.
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn emit(&self, event: &Event) {
        tracing::debug!(
            event = event.name(),
            origin = ?event.origin(),
            cancelled = event.is_cancelled(),
            subscriber_count = self.tx.receiver_count(),
            "Event handled"
        );
        let _ = self.tx.send(event.clone());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_can_be_cancelled() {
        let mut event = Event::new(ViewId::TopicList, Signal::NewTopicRequest);

        assert!(event.cancel());
        assert!(event.is_cancelled());
    }

    #[test]
    fn test_facts_cannot_be_cancelled() {
        let mut event = Event::new(ViewId::App, Signal::RevisionDeleted(0));

        assert!(!event.cancel());
        assert!(!event.is_cancelled());
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(
            Signal::TopicSwitchRequest(TopicId::from("t")).name(),
            "topic-switch-request"
        );
        assert_eq!(Signal::PanelCollapsedChanged.name(), "panel-collapsed-changed");
        assert!(!Signal::DirtyChanged(true).is_cancelable());
        assert!(Signal::TagAddRequest("rust".into()).is_cancelable());
    }

    #[tokio::test]
    async fn test_bus_delivers_to_all_subscribers() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(&Event::new(ViewId::Editor, Signal::SaveRequest));

        assert_eq!(a.recv().await.unwrap().name(), "save-request");
        assert_eq!(b.recv().await.unwrap().origin(), ViewId::Editor);
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.emit(&Event::new(ViewId::Layout, Signal::PanelCollapsedChanged));
    }
}
