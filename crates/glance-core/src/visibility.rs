//! Show/hide state of the overlay window.

use tracing::debug;

use crate::services::FocusTarget;

/// The window and application hosting the overlay.
pub trait WindowHost {
    /// Order the window front, make it key and activate the app above others.
    fn activate_and_focus(&mut self);
    /// Send the app to the background so focus returns to the previous app.
    fn send_to_background(&mut self);
}

/// Owns the visible flag and drives the window accordingly.
pub struct OverlayVisibilityController<W> {
    window: W,
    visible: bool,
}

impl<W: WindowHost> OverlayVisibilityController<W> {
    /// Wraps a window whose current on-screen state is `visible`.
    pub fn new(window: W, visible: bool) -> Self {
        Self { window, visible }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    /// Shows and focuses the overlay. Calling it while visible re-activates
    /// the window and focuses the prompt again.
    pub fn show(&mut self, focus: &mut impl FocusTarget) {
        debug!(was_visible = self.visible, "showing overlay");
        self.window.activate_and_focus();
        self.visible = true;
        focus.focus_primary_input();
    }

    pub fn hide(&mut self) {
        if !self.visible {
            return;
        }
        debug!("hiding overlay");
        self.window.send_to_background();
        self.visible = false;
    }

    /// Returns the visibility after toggling.
    pub fn toggle(&mut self, focus: &mut impl FocusTarget) -> bool {
        if self.visible {
            self.hide();
        } else {
            self.show(focus);
        }
        self.visible
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum WindowCall {
        Activate,
        Background,
    }

    #[derive(Clone, Default)]
    pub struct RecordingWindow {
        pub calls: Arc<Mutex<Vec<WindowCall>>>,
    }

    impl RecordingWindow {
        pub fn take(&self) -> Vec<WindowCall> {
            std::mem::take(&mut *self.calls.lock())
        }
    }

    impl WindowHost for RecordingWindow {
        fn activate_and_focus(&mut self) {
            self.calls.lock().push(WindowCall::Activate);
        }

        fn send_to_background(&mut self) {
            self.calls.lock().push(WindowCall::Background);
        }
    }
}
