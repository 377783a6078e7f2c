//! Tray icons.

use std::path::Path;

use anyhow::{Context, Result};

const COLOR_CAPTURING: (u8, u8, u8) = (255, 140, 0);
pub const ICON_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/icon.png");

/// What the tray icon currently signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayState {
    Idle,
    /// Waiting for the user to press a new trigger.
    Capturing,
}

/// The decoded icon variants, loaded once at startup.
pub struct TrayIcons {
    idle: tray_icon::Icon,
    capturing: tray_icon::Icon,
}

impl TrayIcons {
    pub fn load() -> Result<Self> {
        Ok(Self {
            idle: load_icon(ICON_PATH, None)?,
            capturing: load_icon(ICON_PATH, Some(COLOR_CAPTURING))?,
        })
    }

    pub fn icon(&self, state: TrayState) -> tray_icon::Icon {
        match state {
            TrayState::Idle => self.idle.clone(),
            TrayState::Capturing => self.capturing.clone(),
        }
    }
}

fn load_icon(path: impl AsRef<Path>, recolor: Option<(u8, u8, u8)>) -> Result<tray_icon::Icon> {
    let path = path.as_ref();
    let mut image = image::open(path)
        .with_context(|| format!("Failed to open icon at {:?}", path))?
        .into_rgba8();

    if let Some((r, g, b)) = recolor {
        for pixel in image.pixels_mut() {
            pixel[0] = r;
            pixel[1] = g;
            pixel[2] = b;
        }
    }

    let (width, height) = image.dimensions();
    tray_icon::Icon::from_rgba(image.into_raw(), width, height).context("Failed to build tray icon")
}
