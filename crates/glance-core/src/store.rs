//! Persistence of the overlay trigger.
//!
//! The record is a tiny TOML file next to the main config. Loading never
//! fails: a missing, unreadable or malformed record yields the default
//! trigger. Saving goes through a temporary file in the same directory that
//! is renamed over the record, so a torn write is never observed by `load`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::keys::Modifiers;
use crate::{APP_NAME, Trigger};

const TRIGGER_FILE: &str = "trigger.toml";

/// Errors from writing a persisted record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no configuration directory available")]
    NoConfigDir,

    #[error("failed to serialize record: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// On-disk shape of a trigger. The mask uses `CGEventFlags` bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
struct TriggerRecord {
    modifier_mask: u64,
    key_code: u64,
}

impl From<Trigger> for TriggerRecord {
    fn from(trigger: Trigger) -> Self {
        Self {
            modifier_mask: trigger.modifiers().to_mask(),
            key_code: u64::from(trigger.key_code()),
        }
    }
}

impl TriggerRecord {
    fn into_trigger(self) -> Option<Trigger> {
        let modifiers = Modifiers::from_mask(self.modifier_mask)?;
        let key_code = u16::try_from(self.key_code).ok()?;
        Trigger::new(modifiers, key_code)
    }
}

/// Loads and saves the persisted trigger.
#[derive(Debug, Clone)]
pub struct TriggerStore {
    path: PathBuf,
}

impl TriggerStore {
    /// Creates a store at the default location inside the user config directory.
    pub fn new() -> Result<Self, StoreError> {
        let dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
        Ok(Self::with_config_dir(dir.join(APP_NAME)))
    }

    /// Creates a store keeping its record inside `dir`.
    pub fn with_config_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(TRIGGER_FILE),
        }
    }

    /// Returns the path of the trigger record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted trigger, or the default when there is none or it
    /// cannot be used.
    pub fn load(&self) -> Trigger {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "no trigger record, using default");
                return Trigger::DEFAULT;
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "failed to read trigger record, using default");
                return Trigger::DEFAULT;
            }
        };

        let record = match toml::from_str::<TriggerRecord>(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "unparsable trigger record, using default");
                return Trigger::DEFAULT;
            }
        };

        match record.into_trigger() {
            Some(trigger) => {
                info!(%trigger, "loaded custom trigger");
                trigger
            }
            None => {
                warn!(?record, "trigger record out of range, using default");
                Trigger::DEFAULT
            }
        }
    }

    /// Atomically replaces the persisted trigger.
    pub fn save(&self, trigger: Trigger) -> Result<(), StoreError> {
        write_record(&self.path, &TriggerRecord::from(trigger))?;
        debug!(%trigger, path = ?self.path, "trigger saved");
        Ok(())
    }
}

/// Serializes `record` and renames it over `path` through a synced temporary
/// file in the same directory.
pub(crate) fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::io(path, io::ErrorKind::InvalidInput.into()))?;

    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

    let serialized = toml::to_string(record)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(serialized.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
    Ok(())
}
