use std::sync::Arc;

use anyhow::Result;
use arboard::Clipboard;
use glance::event::GlanceEvent;
use glance::icon::{TrayIcons, TrayState};
use glance::notify::NotificationLayer;
use glance::tap::SessionKeyTap;
use glance::view::ScriptedPane;
use glance::window::OverlayWindow;
use glance::{
    APP_NAME_PRETTY, ConfigManager, DEFAULT_LOG_LEVEL, GlobalKeyMonitor, Overlay, Service,
    Trigger, TriggerCaptureSession, TriggerStore, VERSION,
};
use glance_core::keys::Modifiers;
use glance_core::{
    BeginOutcome, Command, FrameStore, LocalKey, LocalOutcome, OverlayVisibilityController,
    ServiceSwitchController,
};
use parking_lot::Mutex;
use tao::event::{ElementState, Event, MouseButton, StartCause, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder};
use tao::keyboard::{Key, ModifiersState};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tray_icon::menu::{AboutMetadataBuilder, Menu, MenuEvent, MenuItem, PredefinedMenuItem};
use tray_icon::{TrayIcon, TrayIconBuilder};

/// Exit status when the global hotkey is required but cannot be installed.
const HOTKEY_UNAVAILABLE_EXIT_CODE: i32 = 1;

type AppOverlay = Overlay<OverlayWindow, ScriptedPane>;

fn main() -> Result<()> {
    // Initialize the logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GLANCE_LOG")
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL)),
        )
        .finish()
        .with(NotificationLayer::new())
        .init();

    // Load config
    let config_manager = ConfigManager::new()?;
    let config = config_manager.load()?;
    // save back the config to create the file if it doesn't exist
    config_manager.save(&config)?;

    let store = Arc::new(TriggerStore::new()?);
    let frames = FrameStore::new()?;
    let mut monitor = GlobalKeyMonitor::new(SessionKeyTap::new());
    let session = TriggerCaptureSession::new(monitor.handle(), store.clone());

    let mut clipboard = Clipboard::new()?;
    let icons = TrayIcons::load()?;

    // Create the tray menu
    let tray_menu = Menu::new();
    let item_show = MenuItem::new("Show", true, None);
    let item_hide = MenuItem::new("Hide", true, None);
    let item_home = MenuItem::new("Home", true, None);
    let item_gemini = MenuItem::new("Switch to Gemini", true, None);
    let item_claude = MenuItem::new("Switch to Claude", true, None);
    let item_trigger = MenuItem::new("Set New Trigger", true, None);
    let item_copy_config = MenuItem::new("Copy config path", true, None);
    let item_quit = MenuItem::new("Quit", true, None);
    tray_menu.append_items(&[
        // the name of the app
        &MenuItem::new(APP_NAME_PRETTY, false, None),
        &PredefinedMenuItem::separator(),
        &item_show,
        &item_hide,
        &item_home,
        &PredefinedMenuItem::separator(),
        &item_gemini,
        &item_claude,
        &PredefinedMenuItem::separator(),
        &item_trigger,
        &PredefinedMenuItem::about(
            None,
            Some(
                AboutMetadataBuilder::new()
                    .version(Some(VERSION.to_owned()))
                    .build(),
            ),
        ),
        &item_copy_config,
        &PredefinedMenuItem::separator(),
        &item_quit,
    ])?;

    let menu_channel = MenuEvent::receiver();

    #[allow(unused_mut)]
    let mut event_loop: EventLoop<GlanceEvent> = EventLoopBuilder::with_user_event().build();
    #[cfg(target_os = "macos")]
    {
        // Menu-bar only: no Dock icon, no app switcher entry.
        use tao::platform::macos::{ActivationPolicy, EventLoopExtMacOS};
        event_loop.set_activation_policy(ActivationPolicy::Accessory);
    }
    let event_sender = event_loop.create_proxy();

    let window = OverlayWindow::build(&event_loop, frames.load())?;
    let mut overlay: AppOverlay = Overlay::new(
        OverlayVisibilityController::new(window, false),
        ServiceSwitchController::new(
            ScriptedPane::new(Service::Gemini, config.home_url(Service::Gemini)),
            ScriptedPane::new(Service::Claude, config.home_url(Service::Claude)),
            config.start_service,
        ),
    );
    sync_service_items(&overlay, &item_gemini, &item_claude);

    let mut icon_tray: Option<TrayIcon> = None;
    let mut modifiers = ModifiersState::empty();
    let mut capturing = false;
    let mut frame_dirty = false;

    event_loop.run(move |event, target, control_flow| {
        *control_flow = ControlFlow::Wait;

        if let Event::NewEvents(StartCause::Init) = event {
            // We create the icon once the event loop is actually running
            // to prevent issues like https://github.com/tauri-apps/tray-icon/issues/90
            match TrayIconBuilder::new()
                .with_menu(Box::new(tray_menu.clone()))
                .with_icon(icons.icon(TrayState::Idle))
                .build()
            {
                Ok(tray) => {
                    icon_tray.replace(tray);
                }
                Err(e) => error!("Failed to create tray icon: {}", e),
            }

            // We have to request a redraw here to have the icon actually show up.
            // Tao only exposes a redraw method on the Window so we use core-foundation directly.
            #[cfg(target_os = "macos")]
            unsafe {
                use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};

                let rl = CFRunLoopGetMain();
                CFRunLoopWakeUp(rl);
            }

            // The tap attaches to this thread's run loop, so it has to be
            // installed from inside the running event loop.
            let toggle_sender = Mutex::new(event_sender.clone());
            let started = monitor.start(store.load(), move || {
                toggle_sender.lock().send_event(GlanceEvent::Toggle).ok();
            });
            if let Err(e) = started {
                error!("Global hotkey unavailable: {}", e);
                if config.require_global_hotkey {
                    icon_tray.take();
                    std::process::exit(HOTKEY_UNAVAILABLE_EXIT_CODE);
                }
                warn!("Continuing with the tray menu only");
            }
            set_tooltip(
                icon_tray.as_ref(),
                &format!("{} - {}", APP_NAME_PRETTY, monitor.trigger()),
            );

            if config.show_on_launch {
                overlay.show();
                flush_scripts(&mut overlay);
            }

            info!(trigger = %monitor.trigger(), service = %overlay.current(), "Glance ready");
        }

        if let Ok(event) = menu_channel.try_recv() {
            if event.id == item_quit.id() {
                monitor.stop();
                icon_tray.take();
                *control_flow = ControlFlow::Exit;
            } else if event.id == item_show.id() {
                overlay.show();
            } else if event.id == item_hide.id() {
                overlay.hide();
            } else if event.id == item_home.id() {
                overlay.dispatch(Command::GoHome);
            } else if event.id == item_gemini.id() {
                overlay.switch_to(Service::Gemini);
            } else if event.id == item_claude.id() {
                overlay.switch_to(Service::Claude);
            } else if event.id == item_trigger.id() {
                if capturing {
                    if session.cancel() {
                        info!("Trigger capture cancelled");
                    }
                    capturing = false;
                    item_trigger.set_text("Set New Trigger");
                    on_capture_ended(monitor.trigger(), icon_tray.as_ref(), &icons);
                } else {
                    let sender = event_sender.clone();
                    match session.begin(move |result| {
                        sender.send_event(GlanceEvent::capture_finished(result)).ok();
                    }) {
                        BeginOutcome::Started | BeginOutcome::AlreadyPending => {
                            capturing = true;
                            item_trigger.set_text("Cancel Trigger Capture");
                            set_tray_state(icon_tray.as_ref(), &icons, TrayState::Capturing);
                            set_tooltip(icon_tray.as_ref(), "Press the new trigger");
                        }
                        BeginOutcome::MonitorInactive => {
                            warn!("Cannot set a new trigger while the global hotkey is unavailable");
                        }
                    }
                }
            } else if event.id == item_copy_config.id() {
                if let Err(e) =
                    clipboard.set_text(config_manager.config_path().to_string_lossy().into_owned())
                {
                    error!("Failed to copy config path to clipboard: {}", e);
                }
            }
            sync_service_items(&overlay, &item_gemini, &item_claude);
            flush_scripts(&mut overlay);
        }

        match event {
            // Handle user provided events
            Event::UserEvent(GlanceEvent::Toggle) => {
                let visible = overlay.toggle();
                debug!(visible, "Overlay toggled");
                flush_scripts(&mut overlay);
            }
            Event::UserEvent(GlanceEvent::TriggerCaptured(trigger)) => {
                info!(%trigger, "New trigger saved");
                capturing = false;
                item_trigger.set_text("Set New Trigger");
                on_capture_ended(trigger, icon_tray.as_ref(), &icons);
            }
            Event::UserEvent(GlanceEvent::TriggerCaptureFailed(reason)) => {
                error!("New trigger not saved, keeping {}: {}", monitor.trigger(), reason);
                capturing = false;
                item_trigger.set_text("Set New Trigger");
                on_capture_ended(monitor.trigger(), icon_tray.as_ref(), &icons);
            }
            Event::WindowEvent {
                window_id, event, ..
            } if window_id == overlay.window().id() => match event {
                WindowEvent::ModifiersChanged(state) => modifiers = state,
                WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                    let Key::Character(text) = event.key_without_modifiers() else {
                        return;
                    };
                    let Some(character) = text.chars().next() else {
                        return;
                    };
                    let key = LocalKey::new(local_modifiers(modifiers), character);
                    match overlay.handle_local_key(key) {
                        LocalOutcome::Quit => {
                            monitor.stop();
                            icon_tray.take();
                            *control_flow = ControlFlow::Exit;
                        }
                        LocalOutcome::Handled => {
                            sync_service_items(&overlay, &item_gemini, &item_claude);
                            flush_scripts(&mut overlay);
                        }
                        LocalOutcome::Ignored => {}
                    }
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => overlay.window().drag(),
                WindowEvent::Moved(_) | WindowEvent::Resized(_) => frame_dirty = true,
                WindowEvent::CloseRequested => overlay.hide(),
                _ => {}
            },
            _ => {}
        }

        if !overlay.is_visible() || *control_flow == ControlFlow::Exit {
            save_frame(&overlay, &frames, &mut frame_dirty);
        }
        overlay.window().yield_activation(target);
    });
}

/// Persists the window frame if it moved or resized since the last save.
fn save_frame(overlay: &AppOverlay, frames: &FrameStore, dirty: &mut bool) {
    if !std::mem::take(dirty) {
        return;
    }
    let Some(frame) = overlay.window().frame() else {
        return;
    };
    if let Err(e) = frames.save(frame) {
        warn!("Failed to save window frame: {}", e);
    }
}

fn on_capture_ended(trigger: Trigger, tray: Option<&TrayIcon>, icons: &TrayIcons) {
    set_tray_state(tray, icons, TrayState::Idle);
    set_tooltip(tray, &format!("{} - {}", APP_NAME_PRETTY, trigger));
}

fn set_tray_state(tray: Option<&TrayIcon>, icons: &TrayIcons, state: TrayState) {
    if let Some(tray) = tray {
        if let Err(e) = tray.set_icon(Some(icons.icon(state))) {
            warn!("Failed to update tray icon: {}", e);
        }
    }
}

fn set_tooltip(tray: Option<&TrayIcon>, tooltip: &str) {
    if let Some(tray) = tray {
        if let Err(e) = tray.set_tooltip(Some(tooltip)) {
            warn!("Failed to update tray tooltip: {}", e);
        }
    }
}

/// The menu item of the active service is disabled.
fn sync_service_items(overlay: &AppOverlay, gemini: &MenuItem, claude: &MenuItem) {
    gemini.set_enabled(overlay.can_switch_to(Service::Gemini));
    claude.set_enabled(overlay.can_switch_to(Service::Claude));
}

/// Hands queued page scripts to the log; panes have no page host in this build.
fn flush_scripts(overlay: &mut AppOverlay) {
    for service in Service::ALL {
        for script in overlay.services_mut().view_mut(service).take_scripts() {
            debug!(%service, %script, "Page script");
        }
    }
}

fn local_modifiers(state: ModifiersState) -> Modifiers {
    let mut modifiers = Modifiers::NONE;
    if state.shift_key() {
        modifiers |= Modifiers::SHIFT;
    }
    if state.control_key() {
        modifiers |= Modifiers::CONTROL;
    }
    if state.alt_key() {
        modifiers |= Modifiers::OPTION;
    }
    if state.super_key() {
        modifiers |= Modifiers::COMMAND;
    }
    modifiers
}
