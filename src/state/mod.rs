// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistence of the previous measurement.
//!
//! The sanitizer needs the measurement taken by the previous run. The
//! [`StateStore`] trait abstracts where it is kept; [`FileStateStore`] keeps
//! it as a JSON file.
//!
//! # Examples
//!
//! ```no_run
//! use luxws::state::{FileStateStore, StateStore};
//!
//! # async fn example() -> luxws::Result<()> {
//! let store = FileStateStore::new("/configs/last-measurement.json");
//!
//! match store.read_state().await? {
//!     Some(previous) => println!("previous poll at {}", previous.measured_at_time),
//!     None => println!("first run"),
//! }
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StateError;
use crate::types::Measurement;

/// Storage for the most recent measurement.
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// Returns the stored measurement, or `None` if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the stored state exists but cannot be read.
    async fn read_state(&self) -> Result<Option<Measurement>, StateError>;

    /// Replaces the stored measurement.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the measurement cannot be written.
    async fn store_state(&self, measurement: &Measurement) -> Result<(), StateError>;
}

/// Keeps the previous measurement in a JSON file.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl StateStore for FileStateStore {
    async fn read_state(&self) -> Result<Option<Measurement>, StateError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No previous measurement");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let measurement: Measurement = serde_json::from_str(&contents)?;
        tracing::debug!(
            path = %self.path.display(),
            id = %measurement.id,
            "Read previous measurement"
        );
        Ok(Some(measurement))
    }

    async fn store_state(&self, measurement: &Measurement) -> Result<(), StateError> {
        let json = serde_json::to_vec_pretty(measurement)?;

        // Write next to the target and rename, so readers never see a partial file.
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        tokio::fs::write(&staging, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), id = %measurement.id, "Stored measurement");
        Ok(())
    }
}
