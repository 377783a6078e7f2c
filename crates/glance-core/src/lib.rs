//! Core of glance: global hotkey matching, trigger capture and persistence,
//! and the overlay's visibility and service state machines.
//!
//! Nothing here depends on a UI toolkit. The application provides the
//! platform pieces through [`KeyTap`], [`WindowHost`] and [`ServiceView`].

mod capture;
mod config;
mod frame;
pub mod keys;
mod monitor;
mod overlay;
pub mod script;
mod services;
mod shortcuts;
mod store;
mod trigger;
mod visibility;

pub use capture::TriggerCaptureSession;
pub use config::{Config, ConfigManager, default_config_dir};
pub use frame::{FrameStore, WindowFrame};
pub use monitor::{
    BeginOutcome, Disposition, EventSink, GlobalKeyMonitor, KeyEvent, KeyEventKind, KeyTap,
    MonitorError, MonitorHandle,
};
pub use overlay::{LocalOutcome, Overlay};
pub use services::{
    Command, EditAction, FocusTarget, Service, ServiceSwitchController, ServiceView,
};
pub use shortcuts::{LocalKey, LocalShortcut};
pub use store::{StoreError, TriggerStore};
pub use trigger::Trigger;
pub use visibility::{OverlayVisibilityController, WindowHost};

/// Application name
pub const APP_NAME: &str = "glance";

/// Pretty application name for display
pub const APP_NAME_PRETTY: &str = "Glance";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";
