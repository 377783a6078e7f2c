//! Desktop notifications for warnings and errors.
//!
//! A menu-bar app has no console, so this is how the user learns about a
//! missing Accessibility permission or a trigger that could not be saved.

use notify_rust::Notification;
use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber, error};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

use crate::icon::ICON_PATH;
use crate::{APP_NAME, APP_NAME_PRETTY};

/// Shows a notification titled after the app and `summary`.
pub fn notify(summary: &str, body: &str) {
    let shown = Notification::new()
        .icon(ICON_PATH)
        .appname(APP_NAME)
        .summary(&format!("{} - {}", APP_NAME_PRETTY, summary))
        .body(body)
        .show();
    if let Err(e) = shown {
        error!("Failed to send notification: {}", e);
    }
}

#[derive(Default)]
struct Message(Option<String>);

impl Visit for Message {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0 = Some(value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{:?}", value));
        }
    }
}

/// Tracing layer that turns warnings and errors into notifications.
///
/// A message identical to the previous one is not shown again, so a
/// condition logged on every retry only interrupts the user once.
#[derive(Debug, Default)]
pub struct NotificationLayer {
    last: Mutex<Option<String>>,
}

impl NotificationLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` and reports whether it differs from the last one.
    fn is_new(&self, message: &str) -> bool {
        let mut last = self.last.lock();
        if last.as_deref() == Some(message) {
            return false;
        }
        *last = Some(message.to_owned());
        true
    }
}

fn summary_for(level: Level, target: &str) -> Option<&'static str> {
    // A failing notification logs an error itself; don't loop on it.
    if target == module_path!() {
        return None;
    }
    match level {
        Level::ERROR => Some("error"),
        Level::WARN => Some("warning"),
        _ => None,
    }
}

impl<S: Subscriber> Layer<S> for NotificationLayer {
    fn on_event(&self, event: &Event<'_>, _: Context<'_, S>) {
        let metadata = event.metadata();
        let Some(summary) = summary_for(*metadata.level(), metadata.target()) else {
            return;
        };

        let mut message = Message::default();
        event.record(&mut message);
        if let Some(body) = message.0.filter(|m| self.is_new(m)) {
            notify(summary, &body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_warnings_and_errors_notify() {
        assert_eq!(summary_for(Level::ERROR, "glance"), Some("error"));
        assert_eq!(summary_for(Level::WARN, "glance_core::store"), Some("warning"));
        assert_eq!(summary_for(Level::INFO, "glance"), None);
        assert_eq!(summary_for(Level::DEBUG, "glance"), None);
    }

    #[test]
    fn test_own_failures_do_not_notify() {
        assert_eq!(summary_for(Level::ERROR, module_path!()), None);
    }

    #[test]
    fn test_repeated_message_is_suppressed() {
        let layer = NotificationLayer::new();
        assert!(layer.is_new("Global hotkey unavailable"));
        assert!(!layer.is_new("Global hotkey unavailable"));
        assert!(layer.is_new("Failed to save trigger"));
        assert!(layer.is_new("Global hotkey unavailable"));
    }
}
