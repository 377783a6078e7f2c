//! Service panes.
//!
//! A pane turns every [`ServiceView`] request into the page script that
//! carries it out. Scripts queue in request order until the page host drains
//! them with [`ScriptedPane::take_scripts`].

use glance_core::script::{self, FOCUS_PROMPT};
use glance_core::{Command, EditAction, Service, ServiceView};
use tracing::debug;

pub struct ScriptedPane {
    service: Service,
    home_url: String,
    hidden: bool,
    raised_above: Option<Service>,
    pending: Vec<String>,
}

impl ScriptedPane {
    pub fn new(service: Service, home_url: impl Into<String>) -> Self {
        Self {
            service,
            home_url: home_url.into(),
            hidden: false,
            raised_above: None,
            pending: Vec::new(),
        }
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn home_url(&self) -> &str {
        &self.home_url
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn raised_above(&self) -> Option<Service> {
        self.raised_above
    }

    /// Drains the scripts waiting to be evaluated in this pane's page, oldest
    /// first.
    pub fn take_scripts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    fn queue(&mut self, script: String) {
        debug!(service = %self.service, len = script.len(), "queued page script");
        self.pending.push(script);
    }
}

fn edit_script(action: EditAction) -> String {
    let name = match action {
        EditAction::SelectAll => "selectAll",
        EditAction::Copy => "copy",
        EditAction::Cut => "cut",
        EditAction::Paste => "paste",
    };
    format!("document.execCommand('{}');", name)
}

impl ServiceView for ScriptedPane {
    fn focus_primary_input(&mut self) {
        self.queue(FOCUS_PROMPT.to_owned());
    }

    fn run_scripted_action(&mut self, command: Command) {
        let script = script::command_script(self.service, command, &self.home_url);
        self.queue(script);
    }

    fn perform_edit(&mut self, action: EditAction) {
        self.queue(edit_script(action));
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        if hidden {
            self.raised_above = None;
        }
    }

    fn raise_above(&mut self, other: Service) {
        self.raised_above = Some(other);
    }
}
