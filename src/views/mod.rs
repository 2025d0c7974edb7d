//! View projections.
//!
//! Each view holds only transient state derived from the store: its own load
//! cell, the last value it displayed, and whatever it changed optimistically
//! while a request of its own is being decided. Views raise signals and never
//! touch each other.

mod editor;
mod history;
mod layout;
mod status;
mod tags;
mod topic_list;

pub use editor::EditorSurface;
pub use history::HistoryList;
pub use layout::{Layout, PANEL_COLLAPSED_WIDTH, PANEL_EXPANDED_WIDTH};
pub use status::StatusIndicator;
pub use tags::{TagEntry, TagPanel};
pub use topic_list::TopicList;

use crate::events::{Event, ViewId};

pub trait View {
    fn id(&self) -> ViewId;

    /// Undo optimistic state after a request of this view was refused.
    fn rollback(&mut self) {}

    /// Called on the origin view once its event has been handled.
    fn after_dispatch(&mut self, event: &Event) {
        if event.is_cancelled() {
            tracing::debug!(view = ?self.id(), event = event.name(), "Rolling back");
            self.rollback();
        }
    }
}
