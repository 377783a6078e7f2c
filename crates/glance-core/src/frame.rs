//! Persistence of the overlay window's position and size across launches.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::write_record;
use crate::{APP_NAME, StoreError};

const FRAME_FILE: &str = "window.toml";

/// Position and size of the overlay window in logical points.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WindowFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WindowFrame {
    /// Frame used on first launch.
    pub const DEFAULT: Self = Self {
        x: 500.0,
        y: 200.0,
        width: 970.0,
        height: 750.0,
    };

    /// Smallest size the window may be resized to.
    pub const MIN_SIZE: (f64, f64) = (400.0, 300.0);

    /// False for frames that are not finite or smaller than [`Self::MIN_SIZE`].
    pub fn is_usable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= Self::MIN_SIZE.0
            && self.height >= Self::MIN_SIZE.1
    }
}

impl Default for WindowFrame {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Loads and saves the window frame next to the trigger record.
#[derive(Debug, Clone)]
pub struct FrameStore {
    path: PathBuf,
}

impl FrameStore {
    pub fn new() -> Result<Self, StoreError> {
        let dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::with_config_dir(dir.join(APP_NAME)))
    }

    pub fn with_config_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(FRAME_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved frame, or the default when none is saved or it is unusable.
    pub fn load(&self) -> WindowFrame {
        let Ok(content) = fs::read_to_string(&self.path) else {
            debug!(path = ?self.path, "no saved window frame");
            return WindowFrame::DEFAULT;
        };
        match toml::from_str::<WindowFrame>(&content) {
            Ok(frame) if frame.is_usable() => frame,
            Ok(frame) => {
                warn!(?frame, "saved window frame is unusable, using default");
                WindowFrame::DEFAULT
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "unparsable window frame, using default");
                WindowFrame::DEFAULT
            }
        }
    }

    pub fn save(&self, frame: WindowFrame) -> Result<(), StoreError> {
        write_record(&self.path, &frame)?;
        debug!(?frame, "window frame saved");
        Ok(())
    }
}
