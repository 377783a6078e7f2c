//! Session-wide key tap backing the [`GlobalKeyMonitor`](crate::GlobalKeyMonitor).
//!
//! On macOS this is a `CGEventTap` attached to the run loop of the thread that
//! installs it, which is the main thread running the tao event loop. The tap is
//! an active filter: events the sink reports consumed are dropped before any
//! application sees them.

pub use imp::SessionKeyTap;

#[cfg(target_os = "macos")]
mod imp {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    use core_foundation::base::TCFType;
    use core_foundation::mach_port::CFMachPortRef;
    use core_foundation::runloop::{CFRunLoop, CFRunLoopSource, kCFRunLoopCommonModes};
    use core_graphics::event::{
        CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement,
        CGEventTapProxy, CGEventType, EventField,
    };
    use glance_core::{Disposition, EventSink, KeyEvent, KeyEventKind, KeyTap, MonitorError};
    use tracing::{debug, error, info, warn};

    #[link(name = "CoreGraphics", kind = "framework")]
    unsafe extern "C" {
        fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
    }

    struct Installed {
        tap: CGEventTap<'static>,
        source: CFRunLoopSource,
        run_loop: CFRunLoop,
    }

    #[derive(Default)]
    pub struct SessionKeyTap {
        installed: Option<Installed>,
    }

    impl SessionKeyTap {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl KeyTap for SessionKeyTap {
        fn install(&mut self, sink: Arc<dyn EventSink>) -> Result<(), MonitorError> {
            if self.installed.is_some() {
                return Err(MonitorError::AlreadyRunning);
            }

            // Filled in once the tap exists; the callback needs it to re-enable
            // the tap after the system disables it.
            let port: Rc<Cell<CFMachPortRef>> = Rc::new(Cell::new(std::ptr::null_mut()));
            let callback_port = port.clone();

            let callback = move |_proxy: CGEventTapProxy,
                                 event_type: CGEventType,
                                 event: &CGEvent|
                  -> Option<CGEvent> {
                let kind = match event_type {
                    CGEventType::KeyDown => KeyEventKind::KeyDown,
                    CGEventType::FlagsChanged => KeyEventKind::FlagsChanged,
                    CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                        warn!(?event_type, "event tap disabled by the system, re-enabling");
                        let port = callback_port.get();
                        if !port.is_null() {
                            unsafe { CGEventTapEnable(port, true) };
                        }
                        return Some(event.clone());
                    }
                    _ => return Some(event.clone()),
                };

                let key = read_key_event(kind, event);
                match sink.handle(&key) {
                    Disposition::Consumed => None,
                    Disposition::PassThrough => Some(event.clone()),
                }
            };

            let tap = CGEventTap::new(
                CGEventTapLocation::Session,
                CGEventTapPlacement::HeadInsertEventTap,
                CGEventTapOptions::Default,
                vec![CGEventType::KeyDown, CGEventType::FlagsChanged],
                callback,
            )
            .map_err(|_| {
                error!("failed to create event tap - is Accessibility permission granted?");
                MonitorError::PermissionDenied
            })?;
            port.set(tap.mach_port.as_concrete_TypeRef());

            let source = tap
                .mach_port
                .create_runloop_source(0)
                .map_err(|_| MonitorError::RunLoop)?;
            let run_loop = CFRunLoop::get_current();
            unsafe {
                run_loop.add_source(&source, kCFRunLoopCommonModes);
            }
            tap.enable();
            info!("event tap created and enabled");

            self.installed = Some(Installed {
                tap,
                source,
                run_loop,
            });
            Ok(())
        }

        fn uninstall(&mut self) {
            let Some(installed) = self.installed.take() else {
                return;
            };
            unsafe {
                CGEventTapEnable(installed.tap.mach_port.as_concrete_TypeRef(), false);
                installed
                    .run_loop
                    .remove_source(&installed.source, kCFRunLoopCommonModes);
            }
            debug!("event tap removed");
        }
    }

    impl Drop for SessionKeyTap {
        fn drop(&mut self) {
            self.uninstall();
        }
    }

    fn read_key_event(kind: KeyEventKind, event: &CGEvent) -> KeyEvent {
        let key_code = event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u16;
        let flags = event.get_flags().bits();
        match kind {
            KeyEventKind::KeyDown => {
                let key = KeyEvent::key_down(flags, key_code);
                if event.get_integer_value_field(EventField::KEYBOARD_EVENT_AUTOREPEAT) != 0 {
                    key.repeated()
                } else {
                    key
                }
            }
            KeyEventKind::FlagsChanged => KeyEvent::flags_changed(flags, key_code),
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod imp {
    use std::sync::Arc;

    use glance_core::{EventSink, KeyTap, MonitorError};

    /// Stand-in for platforms without a session event tap. Installing always
    /// fails, leaving the tray menu as the only way to toggle the overlay.
    #[derive(Debug, Default)]
    pub struct SessionKeyTap;

    impl SessionKeyTap {
        pub fn new() -> Self {
            Self
        }
    }

    impl KeyTap for SessionKeyTap {
        fn install(&mut self, _sink: Arc<dyn EventSink>) -> Result<(), MonitorError> {
            Err(MonitorError::Unsupported)
        }

        fn uninstall(&mut self) {}
    }
}
