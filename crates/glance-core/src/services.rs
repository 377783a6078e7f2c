//! The two chat services and the controller deciding which one is in front.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A web chat hosted in the overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    #[default]
    Gemini,
    Claude,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::Gemini, Service::Claude];

    pub fn other(self) -> Self {
        match self {
            Service::Gemini => Service::Claude,
            Service::Claude => Service::Gemini,
        }
    }

    /// Landing page used when no override is configured.
    pub fn default_home_url(self) -> &'static str {
        match self {
            Service::Gemini => "https://gemini.google.com?referrer=macos-gemini-overlay",
            Service::Claude => "https://claude.ai",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Gemini => write!(f, "Gemini"),
            Service::Claude => write!(f, "Claude"),
        }
    }
}

/// A logical command executed by a service page with its own selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    NewChat,
    ToggleSidebar,
    OpenSettings,
    /// Navigate back to the service's landing page.
    GoHome,
}

/// Text editing actions forwarded to the focused element of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditAction {
    SelectAll,
    Copy,
    Cut,
    Paste,
}

/// The view hosting one service.
pub trait ServiceView {
    /// Fire-and-forget: move keyboard focus to the prompt area.
    fn focus_primary_input(&mut self);
    fn run_scripted_action(&mut self, command: Command);
    fn perform_edit(&mut self, action: EditAction);
    fn set_hidden(&mut self, hidden: bool);
    /// Orders this view above the view of `other`.
    fn raise_above(&mut self, other: Service);
}

/// Something that can move keyboard focus to its primary input.
pub trait FocusTarget {
    fn focus_primary_input(&mut self);
}

/// Tracks the active service and routes commands to its view.
pub struct ServiceSwitchController<V> {
    gemini: V,
    claude: V,
    current: Service,
}

impl<V: ServiceView> ServiceSwitchController<V> {
    /// Takes ownership of both views and puts `initial` in front.
    pub fn new(gemini: V, claude: V, initial: Service) -> Self {
        let mut controller = Self {
            gemini,
            claude,
            current: initial,
        };
        controller.view_mut(initial.other()).set_hidden(true);
        let front = controller.view_mut(initial);
        front.set_hidden(false);
        front.raise_above(initial.other());
        controller
    }

    pub fn current(&self) -> Service {
        self.current
    }

    /// Menu items for the active service are disabled.
    pub fn can_switch_to(&self, service: Service) -> bool {
        service != self.current
    }

    pub fn view(&self, service: Service) -> &V {
        match service {
            Service::Gemini => &self.gemini,
            Service::Claude => &self.claude,
        }
    }

    pub fn view_mut(&mut self, service: Service) -> &mut V {
        match service {
            Service::Gemini => &mut self.gemini,
            Service::Claude => &mut self.claude,
        }
    }

    pub fn active_view_mut(&mut self) -> &mut V {
        self.view_mut(self.current)
    }

    /// Brings `service` to the front. Returns `false`, doing nothing, when it
    /// already is.
    pub fn switch_to(&mut self, service: Service) -> bool {
        if service == self.current {
            debug!(%service, "already active");
            return false;
        }

        let previous = self.current;
        self.view_mut(previous).set_hidden(true);
        let next = self.view_mut(service);
        next.set_hidden(false);
        next.raise_above(previous);
        self.current = service;
        self.view_mut(service).focus_primary_input();

        info!(from = %previous, to = %service, "switched service");
        true
    }

    /// Switches to whichever service is not active and returns it.
    pub fn switch_to_other(&mut self) -> Service {
        let target = self.current.other();
        self.switch_to(target);
        target
    }

    pub fn dispatch_command(&mut self, command: Command) {
        debug!(service = %self.current, ?command, "dispatching command");
        self.active_view_mut().run_scripted_action(command);
    }

    pub fn dispatch_edit(&mut self, action: EditAction) {
        self.active_view_mut().perform_edit(action);
    }
}

impl<V: ServiceView> FocusTarget for ServiceSwitchController<V> {
    fn focus_primary_input(&mut self) {
        self.active_view_mut().focus_primary_input();
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{RecordingView, ViewCall};
    use super::*;

    fn controller() -> (ServiceSwitchController<RecordingView>, RecordingView, RecordingView) {
        let gemini = RecordingView::default();
        let claude = RecordingView::default();
        let controller = ServiceSwitchController::new(gemini.clone(), claude.clone(), Service::Gemini);
        (controller, gemini, claude)
    }

    #[test]
    fn test_initial_layout() {
        let (controller, gemini, claude) = controller();
        assert_eq!(controller.current(), Service::Gemini);
        assert_eq!(
            gemini.take(),
            vec![ViewCall::Hidden(false), ViewCall::RaiseAbove(Service::Claude)]
        );
        assert_eq!(claude.take(), vec![ViewCall::Hidden(true)]);
    }

    #[test]
    fn test_switch_to_claude() {
        let (mut controller, gemini, claude) = controller();
        gemini.take();
        claude.take();

        assert!(controller.switch_to(Service::Claude));
        assert_eq!(controller.current(), Service::Claude);
        assert_eq!(gemini.take(), vec![ViewCall::Hidden(true)]);
        assert_eq!(
            claude.take(),
            vec![
                ViewCall::Hidden(false),
                ViewCall::RaiseAbove(Service::Gemini),
                ViewCall::Focus,
            ]
        );
    }

    #[test]
    fn test_switch_to_current_has_no_side_effects() {
        let (mut controller, gemini, claude) = controller();
        gemini.take();
        claude.take();

        assert!(!controller.switch_to(controller.current()));
        assert!(gemini.take().is_empty());
        assert!(claude.take().is_empty());
    }

    #[test]
    fn test_commands_follow_the_active_service() {
        let (mut controller, gemini, claude) = controller();
        gemini.take();
        claude.take();

        controller.dispatch_command(Command::NewChat);
        assert_eq!(gemini.take(), vec![ViewCall::Script(Command::NewChat)]);

        assert_eq!(controller.switch_to_other(), Service::Claude);
        claude.take();
        controller.dispatch_command(Command::ToggleSidebar);
        controller.dispatch_edit(EditAction::Paste);
        assert_eq!(
            claude.take(),
            vec![
                ViewCall::Script(Command::ToggleSidebar),
                ViewCall::Edit(EditAction::Paste),
            ]
        );
        assert!(gemini.take().iter().all(|c| *c == ViewCall::Hidden(true)));
    }

    #[test]
    fn test_can_switch_to() {
        let (controller, _, _) = controller();
        assert!(!controller.can_switch_to(Service::Gemini));
        assert!(controller.can_switch_to(Service::Claude));
    }

    #[test]
    fn test_service_serde_names() {
        #[derive(Deserialize, Serialize)]
        struct Wrapper {
            service: Service,
        }
        let text = toml::to_string(&Wrapper {
            service: Service::Claude,
        })
        .unwrap();
        assert_eq!(text.trim(), "service = \"claude\"");
        let parsed: Wrapper = toml::from_str("service = \"gemini\"").unwrap();
        assert_eq!(parsed.service, Service::Gemini);
    }
}
