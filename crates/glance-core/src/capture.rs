//! Interactive trigger reconfiguration.
//!
//! While a capture is armed, the monitor routes key events here instead of
//! matching them. The first key press, with whatever modifiers are held,
//! becomes the new trigger. A bare modifier tap (press and release of only
//! modifier keys) is accepted as a modifier-only trigger.
//!
//! Persisting the captured trigger happens on a short-lived worker thread so
//! the tap callback never waits on the disk. The caller hears back either
//! way: with the new trigger, or with the error that kept the old one.

use std::sync::Arc;
use std::thread;

use tracing::{error, info, warn};

use crate::keys::{self, Modifiers};
use crate::monitor::{BeginOutcome, KeyEvent, KeyEventKind, MonitorHandle};
use crate::{StoreError, Trigger, TriggerStore};

pub(crate) type CaptureHandler = Box<dyn FnOnce(Trigger) + Send>;

/// What a capture made of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CaptureStep {
    /// Not part of the capture; match it normally.
    Ignore,
    /// Part of a modifier tap that has not finished yet.
    Pending,
    Captured(Trigger),
}

/// Capture bookkeeping owned by the monitor.
#[derive(Default)]
pub(crate) struct CaptureSlot {
    handler: Option<CaptureHandler>,
    /// Modifiers held so far during a bare modifier tap and the last
    /// modifier key pressed.
    held: Option<(Modifiers, u16)>,
}

impl CaptureSlot {
    pub(crate) fn arm(&mut self, handler: CaptureHandler) {
        self.handler = Some(handler);
        self.held = None;
    }

    pub(crate) fn clear(&mut self) {
        self.handler = None;
        self.held = None;
    }

    pub(crate) fn take_handler(&mut self) -> Option<CaptureHandler> {
        self.held = None;
        self.handler.take()
    }

    pub(crate) fn observe(&mut self, event: &KeyEvent) -> CaptureStep {
        let modifiers = event.modifiers();
        match event.kind {
            KeyEventKind::KeyDown if event.is_repeat => CaptureStep::Ignore,
            KeyEventKind::KeyDown => match Trigger::new(modifiers, event.key_code) {
                Some(trigger) => CaptureStep::Captured(trigger),
                None => CaptureStep::Ignore,
            },
            KeyEventKind::FlagsChanged => {
                if keys::modifier_for_keycode(event.key_code).is_none() {
                    // Caps lock and friends.
                    return CaptureStep::Pending;
                }
                if event.is_modifier_press() {
                    let peak = self.held.map_or(Modifiers::NONE, |(m, _)| m) | modifiers;
                    self.held = Some((peak, event.key_code));
                    return CaptureStep::Pending;
                }
                if !modifiers.is_empty() {
                    return CaptureStep::Pending;
                }
                match self.held.take() {
                    Some((peak, key_code)) => match Trigger::new(peak, key_code) {
                        Some(trigger) => CaptureStep::Captured(trigger),
                        None => CaptureStep::Pending,
                    },
                    None => CaptureStep::Pending,
                }
            }
        }
    }
}

/// Saves a captured trigger and, only if that worked, makes it live.
///
/// On failure the previous trigger stays in effect.
pub(crate) fn persist_capture(
    store: &TriggerStore,
    monitor: &MonitorHandle,
    trigger: Trigger,
) -> Result<Trigger, StoreError> {
    if let Err(e) = store.save(trigger) {
        warn!(%trigger, error = %e, "failed to save new trigger, keeping the previous one");
        return Err(e);
    }
    monitor.update_trigger(trigger);
    Ok(trigger)
}

/// Arms the monitor to record the next key press as the new trigger.
pub struct TriggerCaptureSession {
    monitor: MonitorHandle,
    store: Arc<TriggerStore>,
}

impl TriggerCaptureSession {
    pub fn new(monitor: MonitorHandle, store: Arc<TriggerStore>) -> Self {
        Self { monitor, store }
    }

    /// Starts waiting for a key. `on_done` receives the saved trigger, or the
    /// error that kept the previous one. A second call while one is pending
    /// leaves the pending capture untouched and drops its `on_done`.
    pub fn begin<F>(&self, on_done: F) -> BeginOutcome
    where
        F: FnOnce(Result<Trigger, StoreError>) + Send + 'static,
    {
        let store = self.store.clone();
        let monitor = self.monitor.clone();
        let handler: CaptureHandler = Box::new(move |trigger| {
            let spawned = thread::Builder::new()
                .name("trigger-capture".to_string())
                .spawn(move || {
                    on_done(persist_capture(&store, &monitor, trigger));
                });
            if let Err(e) = spawned {
                error!(error = %e, "failed to spawn trigger capture thread");
            }
        });

        let outcome = self.monitor.arm_capture(handler);
        match outcome {
            BeginOutcome::Started => info!("waiting for a new trigger"),
            BeginOutcome::AlreadyPending => info!("trigger capture already pending"),
            BeginOutcome::MonitorInactive => {
                warn!("cannot capture a trigger while the global key monitor is not running")
            }
        }
        outcome
    }

    /// Abandons a pending capture; the current trigger stays in effect.
    pub fn cancel(&self) -> bool {
        let cancelled = self.monitor.cancel_capture();
        if cancelled {
            info!("trigger capture cancelled");
        }
        cancelled
    }

    pub fn is_pending(&self) -> bool {
        self.monitor.is_capturing()
    }
}
