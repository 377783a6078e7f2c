//! System-wide key monitoring.
//!
//! The platform tap is abstracted behind [`KeyTap`]; it hands every key event
//! to an [`EventSink`] and drops the event when the sink reports it consumed.
//! The monitor keeps its whole state (active flag, capture flag, current
//! trigger) in one atomic word, so swapping the trigger never produces a torn
//! read. Capture mode is armed and claimed under one lock, so exactly one path
//! consumes the captured key.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::capture::{CaptureHandler, CaptureSlot, CaptureStep};
use crate::keys::{self, Modifiers};
use crate::Trigger;

const ACTIVE: u32 = 1 << 31;
const CAPTURE: u32 = 1 << 30;
const TRIGGER_BITS: u32 = 0x0FFF;

/// Errors that can occur while starting the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to create event tap - check Accessibility and Input Monitoring permissions")]
    PermissionDenied,

    #[error("global key monitor is already running")]
    AlreadyRunning,

    #[error("failed to attach event tap to the run loop")]
    RunLoop,

    #[error("global key monitoring is not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    KeyDown,
    /// A modifier key was pressed or released.
    FlagsChanged,
}

/// A keyboard event as delivered by the tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    /// Raw `CGEventFlags` word.
    pub flags: u64,
    pub key_code: u16,
    pub is_repeat: bool,
}

impl KeyEvent {
    pub fn key_down(flags: u64, key_code: u16) -> Self {
        Self {
            kind: KeyEventKind::KeyDown,
            flags,
            key_code,
            is_repeat: false,
        }
    }

    pub fn flags_changed(flags: u64, key_code: u16) -> Self {
        Self {
            kind: KeyEventKind::FlagsChanged,
            flags,
            key_code,
            is_repeat: false,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.is_repeat = true;
        self
    }

    /// Event modifiers masked to the four recognized ones.
    pub fn modifiers(&self) -> Modifiers {
        Modifiers::from_event_flags(self.flags)
    }

    /// True for a flags-changed event where a modifier key went down.
    pub fn is_modifier_press(&self) -> bool {
        self.kind == KeyEventKind::FlagsChanged
            && keys::modifier_for_keycode(self.key_code)
                .is_some_and(|m| self.modifiers().contains(m))
    }
}

/// What the tap should do with an event after the sink looked at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Drop the event; the focused application never sees it.
    Consumed,
    PassThrough,
}

/// Receiver of tapped key events.
pub trait EventSink: Send + Sync {
    fn handle(&self, event: &KeyEvent) -> Disposition;
}

/// A platform facility that delivers system-wide key events to a sink.
pub trait KeyTap {
    /// Installs the tap. Fails with [`MonitorError::PermissionDenied`] when the
    /// OS refuses to create it.
    fn install(&mut self, sink: Arc<dyn EventSink>) -> Result<(), MonitorError>;

    /// Disables and releases the tap. Must tolerate being called when nothing
    /// is installed.
    fn uninstall(&mut self);
}

type ToggleCallback = Arc<dyn Fn() + Send + Sync>;

/// Outcome of arming capture mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    Started,
    /// A capture is already waiting for a key; it keeps waiting.
    AlreadyPending,
    /// The monitor is not running, so no key would ever arrive.
    MonitorInactive,
}

pub(crate) struct Shared {
    state: AtomicU32,
    on_toggle: RwLock<Option<ToggleCallback>>,
    capture: Mutex<CaptureSlot>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: AtomicU32::new(Trigger::DEFAULT.pack()),
            on_toggle: RwLock::new(None),
            capture: Mutex::new(CaptureSlot::default()),
        }
    }

    fn toggle(&self) {
        let callback = self.on_toggle.read().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    fn route_to_capture(&self, event: &KeyEvent) -> Option<Disposition> {
        let mut slot = self.capture.lock();
        // Capture transitions only happen under the slot lock.
        if self.state.load(Ordering::Acquire) & CAPTURE == 0 {
            return None;
        }

        match slot.observe(event) {
            CaptureStep::Ignore => None,
            CaptureStep::Pending => Some(Disposition::PassThrough),
            CaptureStep::Captured(trigger) => {
                self.state.fetch_and(!CAPTURE, Ordering::AcqRel);
                let handler = slot.take_handler();
                drop(slot);

                info!(%trigger, "captured new trigger");
                if let Some(handler) = handler {
                    handler(trigger);
                }

                Some(match event.kind {
                    KeyEventKind::KeyDown => Disposition::Consumed,
                    KeyEventKind::FlagsChanged => Disposition::PassThrough,
                })
            }
        }
    }

    fn match_trigger(&self, event: &KeyEvent) -> Disposition {
        let trigger = Trigger::unpack(self.state.load(Ordering::Acquire) & TRIGGER_BITS);
        let modifiers = event.modifiers();

        match event.kind {
            KeyEventKind::KeyDown => {
                if !trigger.matches(modifiers, event.key_code) {
                    return Disposition::PassThrough;
                }
                // Holding the trigger must not flap the overlay, but the
                // repeats still must not leak into the focused app.
                if !event.is_repeat {
                    debug!(%trigger, "trigger pressed");
                    self.toggle();
                }
                Disposition::Consumed
            }
            KeyEventKind::FlagsChanged => {
                if trigger.is_modifier_only()
                    && event.is_modifier_press()
                    && trigger.matches(modifiers, event.key_code)
                {
                    debug!(%trigger, "modifier trigger pressed");
                    self.toggle();
                }
                // Swallowing modifier changes leaves other apps with stuck
                // modifier state.
                Disposition::PassThrough
            }
        }
    }
}

impl EventSink for Shared {
    fn handle(&self, event: &KeyEvent) -> Disposition {
        let state = self.state.load(Ordering::Acquire);
        if state & ACTIVE == 0 {
            return Disposition::PassThrough;
        }

        if state & CAPTURE != 0 {
            if let Some(disposition) = self.route_to_capture(event) {
                return disposition;
            }
        }

        self.match_trigger(event)
    }
}

/// Cloneable, thread-safe handle to a running monitor's state.
#[derive(Clone)]
pub struct MonitorHandle {
    shared: Arc<Shared>,
}

impl MonitorHandle {
    /// The trigger currently matched against.
    pub fn trigger(&self) -> Trigger {
        Trigger::unpack(self.shared.state.load(Ordering::Acquire) & TRIGGER_BITS)
    }

    /// Replaces the trigger in one atomic step. The very next delivered event
    /// is matched against `trigger`.
    pub fn update_trigger(&self, trigger: Trigger) {
        let previous = self
            .shared
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                Some((s & !TRIGGER_BITS) | trigger.pack())
            })
            .unwrap_or_else(|s| s);
        info!(
            from = %Trigger::unpack(previous & TRIGGER_BITS),
            to = %trigger,
            "trigger updated"
        );
    }

    pub fn is_active(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) & ACTIVE != 0
    }

    pub fn is_capturing(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) & CAPTURE != 0
    }

    pub(crate) fn arm_capture(&self, handler: CaptureHandler) -> BeginOutcome {
        let mut slot = self.shared.capture.lock();
        let state = self.shared.state.load(Ordering::Acquire);
        if state & ACTIVE == 0 {
            return BeginOutcome::MonitorInactive;
        }
        if state & CAPTURE != 0 {
            return BeginOutcome::AlreadyPending;
        }

        slot.arm(handler);
        self.shared.state.fetch_or(CAPTURE, Ordering::AcqRel);
        BeginOutcome::Started
    }

    /// Disarms a pending capture. Returns `false` when none was pending.
    pub fn cancel_capture(&self) -> bool {
        let mut slot = self.shared.capture.lock();
        let previous = self.shared.state.fetch_and(!CAPTURE, Ordering::AcqRel);
        slot.clear();
        previous & CAPTURE != 0
    }
}

/// Watches every key press in the session and toggles the overlay when the
/// trigger is pressed.
pub struct GlobalKeyMonitor {
    handle: MonitorHandle,
    tap: Box<dyn KeyTap>,
}

impl GlobalKeyMonitor {
    pub fn new(tap: impl KeyTap + 'static) -> Self {
        Self {
            handle: MonitorHandle {
                shared: Arc::new(Shared::new()),
            },
            tap: Box::new(tap),
        }
    }

    /// Installs the tap and starts matching against `trigger`.
    pub fn start<F>(&mut self, trigger: Trigger, on_toggle: F) -> Result<(), MonitorError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let shared = &self.handle.shared;
        if shared.state.load(Ordering::Acquire) & ACTIVE != 0 {
            return Err(MonitorError::AlreadyRunning);
        }

        *shared.on_toggle.write() = Some(Arc::new(on_toggle));
        shared
            .state
            .store(ACTIVE | trigger.pack(), Ordering::Release);

        if let Err(e) = self.tap.install(shared.clone()) {
            shared.state.store(trigger.pack(), Ordering::Release);
            shared.on_toggle.write().take();
            return Err(e);
        }

        info!(%trigger, "global key monitor started");
        Ok(())
    }

    /// Disables and releases the tap. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let shared = &self.handle.shared;
        let previous = {
            let mut slot = shared.capture.lock();
            slot.clear();
            shared.state.fetch_and(!(ACTIVE | CAPTURE), Ordering::AcqRel)
        };
        if previous & ACTIVE == 0 {
            return;
        }

        self.tap.uninstall();
        shared.on_toggle.write().take();
        info!("global key monitor stopped");
    }

    pub fn handle(&self) -> MonitorHandle {
        self.handle.clone()
    }

    pub fn trigger(&self) -> Trigger {
        self.handle.trigger()
    }

    pub fn update_trigger(&self, trigger: Trigger) {
        self.handle.update_trigger(trigger);
    }

    pub fn is_active(&self) -> bool {
        self.handle.is_active()
    }

    pub fn is_capturing(&self) -> bool {
        self.handle.is_capturing()
    }
}

impl Drop for GlobalKeyMonitor {
    fn drop(&mut self) {
        if self.is_active() {
            warn!("global key monitor dropped while running, stopping");
        }
        self.stop();
    }
}
