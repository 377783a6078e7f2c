//! The overlay window as a [`WindowHost`].

use std::cell::Cell;

use glance_core::{WindowFrame, WindowHost};
use tao::dpi::{LogicalPosition, LogicalSize};
use tao::event_loop::EventLoopWindowTarget;
use tao::window::{Window, WindowBuilder, WindowId};

/// Set when the window was sent to the background and the application still
/// has to give up activation, which needs the event loop target.
#[derive(Debug, Default)]
struct BackgroundRequest(Cell<bool>);

impl BackgroundRequest {
    fn raise(&self) {
        self.0.set(true);
    }

    fn clear(&self) {
        self.0.set(false);
    }

    fn take(&self) -> bool {
        self.0.replace(false)
    }
}

/// Borderless, always-on-top window hosting both service panes.
pub struct OverlayWindow {
    window: Window,
    background: BackgroundRequest,
}

impl OverlayWindow {
    pub fn build<T>(target: &EventLoopWindowTarget<T>, frame: WindowFrame) -> anyhow::Result<Self> {
        let (min_width, min_height) = WindowFrame::MIN_SIZE;
        let window = WindowBuilder::new()
            .with_title(crate::APP_NAME_PRETTY)
            .with_decorations(false)
            .with_always_on_top(true)
            .with_resizable(true)
            .with_visible(false)
            .with_position(LogicalPosition::new(frame.x, frame.y))
            .with_inner_size(LogicalSize::new(frame.width, frame.height))
            .with_min_inner_size(LogicalSize::new(min_width, min_height))
            .build(target)?;
        Ok(Self {
            window,
            background: BackgroundRequest::default(),
        })
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }

    /// Current position and size in logical points, if the platform reports
    /// a position.
    pub fn frame(&self) -> Option<WindowFrame> {
        let scale = self.window.scale_factor();
        let position = self.window.outer_position().ok()?.to_logical::<f64>(scale);
        let size = self.window.inner_size().to_logical::<f64>(scale);
        Some(WindowFrame {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        })
    }

    /// Starts a native drag of the borderless window.
    pub fn drag(&self) {
        if let Err(e) = self.window.drag_window() {
            tracing::debug!("Failed to start window drag: {}", e);
        }
    }

    /// Hands activation back to the previously active application after the
    /// window was sent to the background.
    pub fn yield_activation<T>(&self, target: &EventLoopWindowTarget<T>) {
        if self.background.take() {
            hide_application(target);
        }
    }
}

#[cfg(target_os = "macos")]
fn hide_application<T>(target: &EventLoopWindowTarget<T>) {
    use tao::platform::macos::EventLoopWindowTargetExtMacOS;

    target.hide_application();
}

#[cfg(not(target_os = "macos"))]
fn hide_application<T>(_target: &EventLoopWindowTarget<T>) {}

impl WindowHost for OverlayWindow {
    fn activate_and_focus(&mut self) {
        self.background.clear();
        self.window.set_visible(true);
        self.window.set_focus();
    }

    fn send_to_background(&mut self) {
        self.window.set_visible(false);
        self.background.raise();
    }
}
