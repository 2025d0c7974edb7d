//! Three-column layout: navigation, editor, attributes.

use super::View;
use crate::events::{Event, Signal, ViewId};

pub const PANEL_EXPANDED_WIDTH: u32 = 250;
pub const PANEL_COLLAPSED_WIDTH: u32 = 50;

#[derive(Debug)]
pub struct Layout {
    width: u32,
    nav_collapsed: bool,
    attr_collapsed: bool,
    editor_width: u32,
}

impl Layout {
    pub fn new(width: u32) -> Self {
        let mut layout = Self {
            width,
            nav_collapsed: false,
            attr_collapsed: false,
            editor_width: 0,
        };
        layout.recompute();
        layout
    }

    pub fn toggle_nav(&mut self) -> Signal {
        self.nav_collapsed = !self.nav_collapsed;
        Signal::PanelCollapsedChanged
    }

    pub fn toggle_attr(&mut self) -> Signal {
        self.attr_collapsed = !self.attr_collapsed;
        Signal::PanelCollapsedChanged
    }

    pub fn resize(&mut self, width: u32) {
        self.width = width;
        self.recompute();
    }

    pub fn observe(&mut self, event: &Event) {
        if let Signal::PanelCollapsedChanged = event.signal() {
            self.recompute();
        }
    }

    pub fn nav_width(&self) -> u32 {
        panel_width(self.nav_collapsed)
    }

    pub fn attr_width(&self) -> u32 {
        panel_width(self.attr_collapsed)
    }

    pub fn editor_width(&self) -> u32 {
        self.editor_width
    }

    fn recompute(&mut self) {
        self.editor_width = self
            .width
            .saturating_sub(self.nav_width() + self.attr_width());
    }
}

fn panel_width(collapsed: bool) -> u32 {
    if collapsed {
        PANEL_COLLAPSED_WIDTH
    } else {
        PANEL_EXPANDED_WIDTH
    }
}

impl View for Layout {
    fn id(&self) -> ViewId {
        ViewId::Layout
    }
}
