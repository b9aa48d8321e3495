//! Host-wide single-instance guard for the passive device role

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use gpanel_core::prelude::*;

const LOCK_FILENAME: &str = "ginga-panel-passive.lock";

/// Default lock file shared by every panel on this host
pub fn default_lock_path() -> PathBuf {
    std::env::temp_dir().join(LOCK_FILENAME)
}

/// Held for as long as a passive run is live.
///
/// Backed by an advisory exclusive lock, so the OS releases it if the panel
/// dies without cleaning up.
#[derive(Debug)]
pub struct PassiveGuard {
    file: File,
    path: PathBuf,
}

impl PassiveGuard {
    /// Take the lock, or fail with `PassiveAlreadyRunning` if another passive
    /// run holds it
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::config(format!("Failed to open {:?}: {}", path, e)))?;

        if let Err(e) = file.try_lock_exclusive() {
            debug!("Passive lock {:?} is held: {}", path, e);
            return Err(Error::PassiveAlreadyRunning);
        }

        info!("Acquired passive device lock {:?}", path);
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PassiveGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release passive lock {:?}: {}", self.path, e);
        } else {
            debug!("Released passive device lock {:?}", self.path);
        }
    }
}
