//! Application events for the tao event loop.

use glance_core::{StoreError, Trigger};

/// Events posted to the tao event loop from other threads.
#[derive(Debug, Clone)]
pub enum GlanceEvent {
    /// The global trigger was pressed
    Toggle,
    /// A new trigger was captured and saved
    TriggerCaptured(Trigger),
    /// A key was captured but could not be saved; the previous trigger stays
    TriggerCaptureFailed(String),
}

impl GlanceEvent {
    /// The event ending a trigger capture with `result`.
    pub fn capture_finished(result: Result<Trigger, StoreError>) -> Self {
        match result {
            Ok(trigger) => Self::TriggerCaptured(trigger),
            Err(e) => Self::TriggerCaptureFailed(e.to_string()),
        }
    }
}
