// Re-export from the core crate
pub use glance_core::{
    APP_NAME, APP_NAME_PRETTY, Config, ConfigManager, DEFAULT_LOG_LEVEL, GlobalKeyMonitor,
    Overlay, Service, Trigger, TriggerCaptureSession, TriggerStore,
};

// App-specific modules
pub mod event;
pub mod icon;
pub mod notify;
pub mod tap;
pub mod view;
pub mod window;

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
