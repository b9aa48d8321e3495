//! Data-carousel cache cleanup

use std::path::{Path, PathBuf};

use gpanel_core::prelude::*;

/// Where the engine caches received data-carousel objects
pub fn default_carousel_dir() -> PathBuf {
    std::env::temp_dir().join("ginga").join("carousel")
}

/// Remove the carousel cache if present. Failures are logged, never fatal.
pub fn remove_carousel(dir: &Path) {
    if !dir.exists() {
        return;
    }
    match std::fs::remove_dir_all(dir) {
        Ok(()) => debug!("Removed carousel cache {:?}", dir),
        Err(e) => warn!("Failed to remove carousel cache {:?}: {}", dir, e),
    }
}
