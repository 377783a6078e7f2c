//! JavaScript snippets that implement commands inside each service page.
//!
//! Each service exposes different DOM hooks for the same command, so every
//! snippet tries a list of selectors and falls back to navigation where that
//! makes sense. `{HOME}` in a template is replaced by the quoted home URL.

use crate::services::{Command, Service};

const HOME_PLACEHOLDER: &str = "{HOME}";

/// Focuses the prompt box of either service.
pub const FOCUS_PROMPT: &str = r#"(function(){
  const selectors = [
    '[aria-label="Enter a prompt here"]',
    '[data-placeholder="Ask Gemini"]',
    '[data-placeholder="Message Claude"]',
    '[data-placeholder^="Send a message"]',
    'textarea'
  ];
  for (const sel of selectors) {
    const el = document.querySelector(sel);
    if (el) { el.focus(); break; }
  }
})();"#;

const GEMINI_NEW_CHAT: &str = r#"(function(){
  const sel = '[aria-label="New chat"], [aria-label="New conversation"], [data-command="new-conversation"]';
  const btn = document.querySelector(sel);
  if (btn) { btn.click(); } else { location.href = {HOME}; }
})();"#;

const CLAUDE_NEW_CHAT: &str = r#"(function(){
  const selectors = [
    'button[aria-label="Open new chat"]',
    'button[aria-label*="New Chat"]'
  ];
  for (const sel of selectors) {
    const btn = document.querySelector(sel);
    if (btn) { btn.click(); return; }
  }
  location.href = {HOME};
})();"#;

const TOGGLE_SIDEBAR: &str = r#"(function(){
  const selectors = [
    '[aria-label="Main menu"]',
    '[data-test-id="side-nav-menu-button"]'
  ];
  for (const sel of selectors) {
    const btn = document.querySelector(sel);
    if (btn) { btn.click(); break; }
  }
})();"#;

const GEMINI_SETTINGS: &str = r#"(function(){
  function clickSettings(){
    const btn = document.querySelector('[aria-label="Settings & help"], [data-test-id="settings-and-help-button"]');
    if (btn) { btn.click(); return true; }
    return false;
  }
  function clickSaved(){
    let link = document.querySelector('a[href*="/saved-info"]');
    if (!link) {
      const items = document.querySelectorAll('a[role="menuitem"], button[role="menuitem"]');
      for (const el of items) {
        if (el.textContent && el.textContent.trim().toLowerCase().includes('saved info')) { link = el; break; }
      }
    }
    if (link) { link.click(); }
  }
  if (clickSettings()) { setTimeout(clickSaved, 50); }
})();"#;

const CLAUDE_SETTINGS: &str = r#"(function(){
  const link = document.querySelector('a[href="/settings"], a[href^="/settings/"]');
  if (link) { link.click(); } else { location.href = new URL('/settings', {HOME}).href; }
})();"#;

const GO_HOME: &str = r#"location.href = {HOME};"#;

/// Builds the snippet running `command` in `service`, whose landing page is
/// `home_url`.
pub fn command_script(service: Service, command: Command, home_url: &str) -> String {
    let template = match (service, command) {
        (Service::Gemini, Command::NewChat) => GEMINI_NEW_CHAT,
        (Service::Claude, Command::NewChat) => CLAUDE_NEW_CHAT,
        (_, Command::ToggleSidebar) => TOGGLE_SIDEBAR,
        (Service::Gemini, Command::OpenSettings) => GEMINI_SETTINGS,
        (Service::Claude, Command::OpenSettings) => CLAUDE_SETTINGS,
        (_, Command::GoHome) => GO_HOME,
    };
    template.replace(HOME_PLACEHOLDER, &js_string(home_url))
}

/// Quotes `s` as a single-quoted JavaScript string literal.
fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            '<' => out.push_str("\\x3C"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chat_falls_back_to_home() {
        let home = Service::Claude.default_home_url();
        let script = command_script(Service::Claude, Command::NewChat, home);
        assert!(script.contains("Open new chat"));
        assert!(script.contains("location.href = 'https://claude.ai';"));
        assert!(!script.contains(HOME_PLACEHOLDER));
    }

    #[test]
    fn test_services_use_their_own_selectors() {
        let gemini = command_script(Service::Gemini, Command::NewChat, "https://g");
        let claude = command_script(Service::Claude, Command::NewChat, "https://c");
        assert!(gemini.contains("new-conversation"));
        assert!(!claude.contains("new-conversation"));

        let gemini = command_script(Service::Gemini, Command::OpenSettings, "https://g");
        assert!(gemini.contains("saved-info"));
    }

    #[test]
    fn test_every_command_renders_without_placeholder() {
        let commands = [
            Command::NewChat,
            Command::ToggleSidebar,
            Command::OpenSettings,
            Command::GoHome,
        ];
        for service in Service::ALL {
            for command in commands {
                let script = command_script(service, command, service.default_home_url());
                assert!(!script.contains(HOME_PLACEHOLDER), "{service} {command:?}");
            }
        }
    }

    #[test]
    fn test_home_url_is_escaped() {
        let script = command_script(Service::Gemini, Command::GoHome, "https://x/'a\\b</script>");
        assert_eq!(script, r"location.href = 'https://x/\'a\\b\x3C/script>';");
    }
}
