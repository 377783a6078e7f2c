//! End-to-end flows through the public API: tap → monitor → overlay, and
//! capture → store → monitor.

use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use glance_core::keys::{flags, keycode, Modifiers};
use glance_core::{
    BeginOutcome, Command, Disposition, EditAction, EventSink, GlobalKeyMonitor, KeyEvent, KeyTap,
    MonitorError, Overlay, OverlayVisibilityController, Service, ServiceSwitchController,
    ServiceView, Trigger, TriggerCaptureSession, TriggerStore, WindowHost,
};
use tempfile::tempdir;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Clone, Default)]
struct TestTap {
    sink: Arc<Mutex<Option<Arc<dyn EventSink>>>>,
}

impl TestTap {
    fn deliver(&self, event: KeyEvent) -> Disposition {
        let sink = self.sink.lock().unwrap().clone().expect("tap not installed");
        sink.handle(&event)
    }
}

impl KeyTap for TestTap {
    fn install(&mut self, sink: Arc<dyn EventSink>) -> Result<(), MonitorError> {
        *self.sink.lock().unwrap() = Some(sink);
        Ok(())
    }

    fn uninstall(&mut self) {
        self.sink.lock().unwrap().take();
    }
}

#[derive(Clone, Default)]
struct Window {
    front: Arc<Mutex<bool>>,
}

impl WindowHost for Window {
    fn activate_and_focus(&mut self) {
        *self.front.lock().unwrap() = true;
    }

    fn send_to_background(&mut self) {
        *self.front.lock().unwrap() = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Focus,
    Script(Command),
    Hidden(bool),
    Raise(Service),
}

#[derive(Clone, Default)]
struct View {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl View {
    fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl ServiceView for View {
    fn focus_primary_input(&mut self) {
        self.calls.lock().unwrap().push(Call::Focus);
    }

    fn run_scripted_action(&mut self, command: Command) {
        self.calls.lock().unwrap().push(Call::Script(command));
    }

    fn perform_edit(&mut self, _action: EditAction) {}

    fn set_hidden(&mut self, hidden: bool) {
        self.calls.lock().unwrap().push(Call::Hidden(hidden));
    }

    fn raise_above(&mut self, other: Service) {
        self.calls.lock().unwrap().push(Call::Raise(other));
    }
}

/// Monitor wired the way the app does it: the tap callback only posts a
/// message and the overlay toggles on the loop that drains it.
fn monitor_posting_toggles(tap: &TestTap, trigger: Trigger) -> (GlobalKeyMonitor, Receiver<()>) {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let mut monitor = GlobalKeyMonitor::new(tap.clone());
    monitor
        .start(trigger, move || {
            tx.lock().unwrap().send(()).unwrap();
        })
        .unwrap();
    (monitor, rx)
}

fn drain(rx: &Receiver<()>, overlay: &mut Overlay<Window, View>) -> usize {
    let mut n = 0;
    while rx.try_recv().is_ok() {
        overlay.toggle();
        n += 1;
    }
    n
}

fn overlay() -> (Overlay<Window, View>, Window, View, View) {
    let window = Window::default();
    let gemini = View::default();
    let claude = View::default();
    let overlay = Overlay::new(
        OverlayVisibilityController::new(window.clone(), false),
        ServiceSwitchController::new(gemini.clone(), claude.clone(), Service::Gemini),
    );
    gemini.take();
    claude.take();
    (overlay, window, gemini, claude)
}

#[test]
fn default_trigger_toggles_then_captured_trigger_replaces_it() {
    let temp = tempdir().unwrap();
    let store = Arc::new(TriggerStore::with_config_dir(temp.path()));
    let tap = TestTap::default();
    let (mut overlay, window, _, _) = overlay();

    let (monitor, toggles) = monitor_posting_toggles(&tap, store.load());
    assert_eq!(monitor.trigger(), Trigger::DEFAULT);

    let option_space = KeyEvent::key_down(flags::OPTION, keycode::SPACE);
    assert_eq!(tap.deliver(option_space), Disposition::Consumed);
    assert_eq!(drain(&toggles, &mut overlay), 1);
    assert!(overlay.is_visible());
    assert!(*window.front.lock().unwrap());

    assert_eq!(tap.deliver(option_space), Disposition::Consumed);
    assert_eq!(drain(&toggles, &mut overlay), 1);
    assert!(!overlay.is_visible());
    assert!(!*window.front.lock().unwrap());

    // Capture mode: the next key becomes the trigger instead of toggling.
    let session = TriggerCaptureSession::new(monitor.handle(), store.clone());
    let (captured_tx, captured_rx) = mpsc::channel();
    assert_eq!(
        session.begin(move |r| captured_tx.send(r.ok()).unwrap()),
        BeginOutcome::Started
    );
    let shift_control_space =
        KeyEvent::key_down(flags::SHIFT | flags::CONTROL, keycode::SPACE);
    assert_eq!(tap.deliver(shift_control_space), Disposition::Consumed);

    let expected = Trigger::new(Modifiers::SHIFT | Modifiers::CONTROL, keycode::SPACE).unwrap();
    assert_eq!(captured_rx.recv_timeout(WAIT).unwrap(), Some(expected));
    assert_eq!(drain(&toggles, &mut overlay), 0);
    assert_eq!(monitor.trigger(), expected);

    // Persisted across a restart.
    assert_eq!(TriggerStore::with_config_dir(temp.path()).load(), expected);

    // The new trigger toggles, the old one is now an ordinary key.
    assert_eq!(tap.deliver(shift_control_space), Disposition::Consumed);
    assert_eq!(drain(&toggles, &mut overlay), 1);
    assert!(overlay.is_visible());

    assert_eq!(tap.deliver(option_space), Disposition::PassThrough);
    assert_eq!(drain(&toggles, &mut overlay), 0);
    assert!(overlay.is_visible());
}

#[test]
fn switching_to_claude_focuses_it_once() {
    let (mut overlay, _, gemini, claude) = overlay();

    assert!(overlay.switch_to(Service::Claude));
    assert_eq!(overlay.current(), Service::Claude);
    assert_eq!(gemini.take(), vec![Call::Hidden(true)]);
    assert_eq!(
        claude.take(),
        vec![Call::Hidden(false), Call::Raise(Service::Gemini), Call::Focus]
    );

    assert!(!overlay.switch_to(Service::Claude));
    assert!(gemini.take().is_empty());
    assert!(claude.take().is_empty());

    overlay.dispatch(Command::OpenSettings);
    assert_eq!(claude.take(), vec![Call::Script(Command::OpenSettings)]);
}

#[test]
fn corrupted_store_starts_with_default_trigger() {
    let temp = tempdir().unwrap();
    let store = TriggerStore::with_config_dir(temp.path());
    std::fs::write(store.path(), "modifier_mask = 1\nkey_code = 49\n").unwrap();

    let tap = TestTap::default();
    let (_monitor, toggles) = monitor_posting_toggles(&tap, store.load());
    assert_eq!(
        tap.deliver(KeyEvent::key_down(flags::OPTION, keycode::SPACE)),
        Disposition::Consumed
    );
    assert_eq!(toggles.try_iter().count(), 1);
}
