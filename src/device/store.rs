// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device configuration storage.
//!
//! The server holds at most one device record. [`DeviceStore`] is the seam
//! the controller reads it through; [`InMemoryDeviceStore`] is used by tests
//! and by deployments without a data directory, [`FileDeviceStore`] keeps
//! the record in a JSON file across restarts.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::DeviceConfig;
use crate::error::{Result, StorageError};

/// Source of the current device configuration.
pub trait DeviceStore: Send + Sync + fmt::Debug {
    /// Returns the stored configuration, if any.
    fn get(&self) -> Option<DeviceConfig>;

    /// Replaces the stored configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the configuration cannot be persisted.
    fn put(&self, config: DeviceConfig) -> Result<()>;
}

/// Device store held in memory only.
#[derive(Debug, Default)]
pub struct InMemoryDeviceStore {
    config: RwLock<Option<DeviceConfig>>,
}

impl InMemoryDeviceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `config`.
    #[must_use]
    pub fn with_config(config: DeviceConfig) -> Self {
        Self {
            config: RwLock::new(Some(config)),
        }
    }
}

impl DeviceStore for InMemoryDeviceStore {
    fn get(&self) -> Option<DeviceConfig> {
        self.config.read().clone()
    }

    fn put(&self, config: DeviceConfig) -> Result<()> {
        *self.config.write() = Some(config);
        Ok(())
    }
}

/// Device store backed by a JSON file.
///
/// The file is read once when the store is opened and rewritten on every
/// [`put`](DeviceStore::put). Reads are served from memory.
pub struct FileDeviceStore {
    path: PathBuf,
    config: RwLock<Option<DeviceConfig>>,
}

impl FileDeviceStore {
    /// Opens the store at `path`.
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the file exists but cannot be read or does
    /// not contain a valid configuration.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Self::load(&path)?;

        Ok(Self {
            path,
            config: RwLock::new(config),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<Option<DeviceConfig>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No device file found, starting empty");
                return Ok(None);
            }
            Err(e) => return Err(StorageError::from(e).into()),
        };

        let config: DeviceConfig = serde_json::from_str(&contents).map_err(StorageError::from)?;
        tracing::info!(path = %path.display(), "Loaded device configuration");
        Ok(Some(config))
    }

    fn save(&self, config: &DeviceConfig) -> std::result::Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, contents)?;

        tracing::info!(path = %self.path.display(), "Saved device configuration");
        Ok(())
    }
}

impl DeviceStore for FileDeviceStore {
    fn get(&self) -> Option<DeviceConfig> {
        self.config.read().clone()
    }

    fn put(&self, config: DeviceConfig) -> Result<()> {
        // Holding the write lock serializes concurrent writers on the file.
        let mut current = self.config.write();
        self.save(&config)?;
        *current = Some(config);
        Ok(())
    }
}

impl fmt::Debug for FileDeviceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDeviceStore")
            .field("path", &self.path)
            .field("configured", &self.config.read().is_some())
            .finish()
    }
}
