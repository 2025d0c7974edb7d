//! Save affordance and the last failed store mutation.

use super::View;
use crate::errors::AppError;
use crate::events::{Event, Signal, ViewId};

#[derive(Debug, Default)]
pub struct StatusIndicator {
    dirty: bool,
    error: Option<AppError>,
}

impl StatusIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, event: &Event) {
        match event.signal() {
            Signal::DirtyChanged(dirty) => self.dirty = *dirty,
            Signal::RevisionCreated(_) | Signal::RevisionDeleted(_) | Signal::TagChanged(_) => {
                self.error = None
            }
            _ => {}
        }
    }

    pub fn report(&mut self, error: AppError) {
        self.error = Some(error);
    }

    /// Save is offered only with unsaved changes.
    pub fn can_save(&self) -> bool {
        self.dirty
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }
}

impl View for StatusIndicator {
    fn id(&self) -> ViewId {
        ViewId::StatusIndicator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_changes_drive_save_affordance() {
        let mut status = StatusIndicator::new();
        assert!(!status.can_save());

        status.observe(&Event::new(ViewId::Editor, Signal::DirtyChanged(true)));
        assert!(status.can_save());

        status.observe(&Event::new(ViewId::App, Signal::DirtyChanged(false)));
        assert!(!status.can_save());
    }

    #[test]
    fn test_success_clears_reported_error() {
        let mut status = StatusIndicator::new();
        status.report(AppError::BackendUnavailable("down".into()));
        assert!(status.error().is_some());

        status.observe(&Event::new(ViewId::App, Signal::RevisionDeleted(1)));

        assert!(status.error().is_none());
    }
}
