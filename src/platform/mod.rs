//! Platform abstraction layer
//!
//! Tracks browser visibility/focus for the session:
//! - Auto-pause when the tab is hidden or the window loses focus
//! - Audio gating (no sounds while hidden)
//!
//! The host forwards `visibilitychange` / `focus` / `blur` events here. After
//! `detach` (session teardown) further events are ignored.

/// A transition in effective visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    Hidden,
    Shown,
}

#[derive(Debug, Clone)]
pub struct VisibilityManager {
    document_visible: bool,
    window_focused: bool,
    attached: bool,
}

impl Default for VisibilityManager {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityManager {
    pub fn new() -> Self {
        Self {
            document_visible: true,
            window_focused: true,
            attached: true,
        }
    }

    /// Visible and focused
    pub fn is_visible(&self) -> bool {
        self.document_visible && self.window_focused
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// `document.visibilityState` changed
    pub fn set_document_visible(&mut self, visible: bool) -> Option<VisibilityChange> {
        self.update(|m| m.document_visible = visible)
    }

    /// Window `focus` / `blur`
    pub fn set_window_focused(&mut self, focused: bool) -> Option<VisibilityChange> {
        self.update(|m| m.window_focused = focused)
    }

    /// Stop reacting to events (session teardown)
    pub fn detach(&mut self) {
        if self.attached {
            self.attached = false;
            log::debug!("Visibility listener detached");
        }
    }

    fn update(&mut self, apply: impl FnOnce(&mut Self)) -> Option<VisibilityChange> {
        if !self.attached {
            return None;
        }
        let was_visible = self.is_visible();
        apply(self);
        match (was_visible, self.is_visible()) {
            (true, false) => Some(VisibilityChange::Hidden),
            (false, true) => Some(VisibilityChange::Shown),
            _ => None,
        }
    }
}
