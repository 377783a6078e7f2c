//! The overlay as the application shell sees it: one window, two services.

use tracing::debug;

use crate::services::{Command, Service, ServiceSwitchController, ServiceView};
use crate::shortcuts::{LocalKey, LocalShortcut};
use crate::visibility::{OverlayVisibilityController, WindowHost};

/// Result of feeding an in-window key press to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalOutcome {
    Handled,
    /// The user asked to quit the application.
    Quit,
    /// Not a shortcut; the view should receive the key as usual.
    Ignored,
}

pub struct Overlay<W, V> {
    visibility: OverlayVisibilityController<W>,
    services: ServiceSwitchController<V>,
}

impl<W: WindowHost, V: ServiceView> Overlay<W, V> {
    pub fn new(
        visibility: OverlayVisibilityController<W>,
        services: ServiceSwitchController<V>,
    ) -> Self {
        Self {
            visibility,
            services,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visibility.is_visible()
    }

    pub fn current(&self) -> Service {
        self.services.current()
    }

    pub fn can_switch_to(&self, service: Service) -> bool {
        self.services.can_switch_to(service)
    }

    pub fn services(&self) -> &ServiceSwitchController<V> {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut ServiceSwitchController<V> {
        &mut self.services
    }

    pub fn window(&self) -> &W {
        self.visibility.window()
    }

    pub fn show(&mut self) {
        self.visibility.show(&mut self.services);
    }

    pub fn hide(&mut self) {
        self.visibility.hide();
    }

    pub fn toggle(&mut self) -> bool {
        self.visibility.toggle(&mut self.services)
    }

    pub fn switch_to(&mut self, service: Service) -> bool {
        self.services.switch_to(service)
    }

    /// Switches to the inactive service and returns it.
    pub fn toggle_service(&mut self) -> Service {
        self.services.switch_to_other()
    }

    pub fn dispatch(&mut self, command: Command) {
        self.services.dispatch_command(command);
    }

    pub fn handle_local_key(&mut self, key: LocalKey) -> LocalOutcome {
        let Some(shortcut) = LocalShortcut::resolve(key) else {
            return LocalOutcome::Ignored;
        };
        debug!(?shortcut, "local shortcut");

        match shortcut {
            LocalShortcut::SwitchService => {
                self.toggle_service();
            }
            LocalShortcut::Hide => self.hide(),
            LocalShortcut::Quit => return LocalOutcome::Quit,
            LocalShortcut::Command(command) => self.dispatch(command),
            LocalShortcut::Edit(action) => self.services.dispatch_edit(action),
        }
        LocalOutcome::Handled
    }
}
